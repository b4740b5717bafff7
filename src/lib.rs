//! HollowMan - Library
//!
//! このライブラリは、バイナリターゲット（背景キャプチャ、schema生成など）で
//! プロジェクトのモジュールにアクセスするために提供されています。

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod logging;
