//! Application Layer
//!
//! ユースケース（背景キャプチャ、合成ストリーム）と統計管理を実装します。
//!
//! ## モジュール構成
//! - `capture`: 背景キャプチャ（ウォームアップ→1フレーム→保存→プレビュー）
//! - `pipeline`: 単一スレッドの合成ループ（Init → Streaming → Terminated）
//! - `stats`: 統計情報管理（FPS、レイテンシ）

pub mod capture;
pub mod pipeline;
pub mod stats;
