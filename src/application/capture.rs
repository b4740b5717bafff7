//! 背景キャプチャモジュール
//!
//! 代表となる背景フレームを1枚だけ取得して永続化するユースケース。
//! リトライはなく、最初の失敗で終了する。読み取りに失敗した場合は
//! 何も書き込まない。

use crate::domain::{
    config::AppConfig,
    error::DomainResult,
    ports::{BackgroundStorePort, CapturePort, DisplayPort},
};
use std::path::PathBuf;
use std::time::Duration;

/// 背景プレビューウィンドウのタイトル
const WINDOW_TITLE: &str = "Background";

/// 背景キャプチャ設定
#[derive(Debug, Clone)]
pub struct CaptureJobConfig {
    /// 背景画像の保存先（既存ファイルは上書き）
    pub background_path: PathBuf,
    /// 撮影者がフレーム外に出るまでの待機時間
    pub warmup_delay: Duration,
    /// 保存後のプレビュー表示時間
    pub preview_duration: Duration,
}

impl From<&AppConfig> for CaptureJobConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            background_path: PathBuf::from(&config.background.path),
            warmup_delay: config.camera.warmup_delay(),
            preview_duration: config.background.preview_duration(),
        }
    }
}

/// 背景キャプチャ実行コンテキスト
pub struct CaptureJob<C, S, D>
where
    C: CapturePort,
    S: BackgroundStorePort,
    D: DisplayPort,
{
    capture: C,
    store: S,
    display: D,
    config: CaptureJobConfig,
}

impl<C, S, D> CaptureJob<C, S, D>
where
    C: CapturePort,
    S: BackgroundStorePort,
    D: DisplayPort,
{
    pub fn new(capture: C, store: S, display: D, config: CaptureJobConfig) -> Self {
        Self {
            capture,
            store,
            display,
            config,
        }
    }

    /// 背景を1枚キャプチャして保存する
    ///
    /// # Returns
    /// - `Err(DomainError::CaptureFailed)`: 読み取り失敗（ファイルは書き込まれない）
    /// - `Err(DomainError::Store)`: 保存失敗
    pub fn run(mut self) -> DomainResult<()> {
        tracing::info!(
            "Please step out of the frame... capturing background in {:.0}s",
            self.config.warmup_delay.as_secs_f64()
        );
        if !self.config.warmup_delay.is_zero() {
            std::thread::sleep(self.config.warmup_delay);
        }

        let frame = self.capture.read_frame()?;

        self.store.save(&self.config.background_path, &frame)?;
        tracing::info!(
            "Background saved as {}",
            self.config.background_path.display()
        );

        // 確認用に取得した背景をしばらく表示する
        self.display.show(WINDOW_TITLE, &frame)?;
        let _ = self.display.poll_key(self.config.preview_duration)?;

        // selfのDropがカメラとウィンドウを解放する
        Ok(())
    }
}
