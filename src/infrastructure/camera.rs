/// カメラキャプチャアダプタ
///
/// OpenCV videoioを使用したWebカメラからのフレーム取得実装。
///
/// # リソース管理
/// デバイスハンドルはこのアダプタが排他的に所有し、Dropで一度だけ解放する。
/// 正常終了・キー押下・読み取り失敗のどの終了経路でも解放が保証される。

use crate::domain::{CapturePort, DeviceInfo, DomainError, DomainResult, Frame};
use crate::infrastructure::mat_convert;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

/// カメラキャプチャアダプタ
pub struct VideoCaptureAdapter {
    capture: VideoCapture,
    info: DeviceInfo,
    index: i32,
}

impl VideoCaptureAdapter {
    /// カメラデバイスを開く
    ///
    /// # Arguments
    /// - `device_index`: カメラデバイスのインデックス（0 = 既定のカメラ）
    ///
    /// # Returns
    /// - `Err(DomainError::DeviceUnavailable)`: デバイスが開けない
    pub fn open(device_index: i32) -> DomainResult<Self> {
        let capture = VideoCapture::new(device_index, videoio::CAP_ANY).map_err(|e| {
            tracing::error!("Failed to create VideoCapture: {:?}", e);
            DomainError::DeviceUnavailable {
                index: device_index,
            }
        })?;

        let opened = capture.is_opened().map_err(|e| {
            tracing::error!("Failed to query capture state: {:?}", e);
            DomainError::DeviceUnavailable {
                index: device_index,
            }
        })?;
        if !opened {
            return Err(DomainError::DeviceUnavailable {
                index: device_index,
            });
        }

        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|_| DomainError::DeviceUnavailable {
                index: device_index,
            })? as u32;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|_| DomainError::DeviceUnavailable {
                index: device_index,
            })? as u32;
        let name = capture
            .get_backend_name()
            .unwrap_or_else(|_| format!("camera {}", device_index));

        tracing::info!(
            "Camera opened: index={}, {}x{} via {}",
            device_index,
            width,
            height,
            name
        );

        Ok(Self {
            capture,
            info: DeviceInfo {
                width,
                height,
                name,
            },
            index: device_index,
        })
    }
}

impl CapturePort for VideoCaptureAdapter {
    /// フレームを1枚読み取る
    ///
    /// デバイスがフレームを返すまでブロックする。タイムアウトは設けないため、
    /// 応答しないデバイスでは無期限に待つ。
    fn read_frame(&mut self) -> DomainResult<Frame> {
        let mut mat = Mat::default();
        let ok = self.capture.read(&mut mat).map_err(|e| {
            tracing::warn!("Camera read returned an error: {:?}", e);
            DomainError::CaptureFailed
        })?;

        if !ok || mat.empty() {
            return Err(DomainError::CaptureFailed);
        }

        mat_convert::mat_to_frame(&mat)
    }

    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

impl Drop for VideoCaptureAdapter {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(_) => tracing::debug!("Camera released (index {})", self.index),
            Err(e) => tracing::warn!("Failed to release camera: {:?}", e),
        }
    }
}
