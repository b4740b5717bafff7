/// 表示アダプタ
///
/// OpenCV highguiを使用したプレビューウィンドウとキー入力の実装。
///
/// キー入力はwait_keyによるポーリングで、非同期の割り込みはない。
/// 終了キーの応答遅延はポーリングの待ち時間で上限づけられる。
/// ウィンドウはDropで破棄される。

use crate::domain::{DisplayPort, DomainError, DomainResult, Frame, Mask};
use crate::infrastructure::mat_convert;
use opencv::highgui;
use std::time::Duration;

/// 表示アダプタ
pub struct HighguiDisplay;

impl HighguiDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighguiDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for HighguiDisplay {
    fn show(&mut self, window: &str, frame: &Frame) -> DomainResult<()> {
        let mat = mat_convert::frame_to_mat(frame)?;

        // WINDOW_AUTOSIZEで等倍表示（リサイズ不可）。既存ウィンドウなら何もしない
        let _ = highgui::named_window(window, highgui::WINDOW_AUTOSIZE);
        highgui::imshow(window, &mat)
            .map_err(|e| DomainError::Display(format!("Failed to show frame: {:?}", e)))
    }

    fn show_mask(&mut self, window: &str, mask: &Mask) -> DomainResult<()> {
        let mat = mat_convert::mask_to_mat(mask)?;

        let _ = highgui::named_window(window, highgui::WINDOW_AUTOSIZE);
        highgui::imshow(window, &mat)
            .map_err(|e| DomainError::Display(format!("Failed to show mask: {:?}", e)))
    }

    fn poll_key(&mut self, wait: Duration) -> DomainResult<Option<i32>> {
        // wait_keyは0で無期限待ちになるため最低1msを保証する
        let wait_ms = (wait.as_millis().min(i32::MAX as u128) as i32).max(1);

        let key = highgui::wait_key(wait_ms)
            .map_err(|e| DomainError::Display(format!("Failed to wait for key: {:?}", e)))?;

        Ok(if key >= 0 { Some(key) } else { None })
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            tracing::warn!("Failed to destroy windows: {:?}", e);
        } else {
            tracing::debug!("Display windows destroyed");
        }
    }
}
