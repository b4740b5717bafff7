/// 背景画像ストアアダプタ
///
/// OpenCV imgcodecsを使用した背景画像ファイルの読み書き実装。
/// 背景画像はcapture_backgroundとHollowManをつなぐ唯一の外部成果物で、
/// 形式はパスの拡張子で決まる（imwrite/imreadが対応する形式なら何でもよい)。

use crate::domain::{BackgroundStorePort, DomainError, DomainResult, Frame};
use crate::infrastructure::mat_convert;
use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use std::path::Path;

/// 背景画像ストアアダプタ
pub struct ImageFileStore;

impl ImageFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn path_str(path: &Path) -> DomainResult<&str> {
    path.to_str()
        .ok_or_else(|| DomainError::Store(format!("Non-UTF8 path: {}", path.display())))
}

impl BackgroundStorePort for ImageFileStore {
    fn save(&mut self, path: &Path, frame: &Frame) -> DomainResult<()> {
        let mat = mat_convert::frame_to_mat(frame)?;
        let path_str = path_str(path)?;

        let written = imgcodecs::imwrite(path_str, &mat, &Vector::new())
            .map_err(|e| DomainError::Store(format!("Failed to write {}: {:?}", path_str, e)))?;
        if !written {
            return Err(DomainError::Store(format!(
                "imwrite rejected path: {}",
                path_str
            )));
        }

        tracing::info!("Background saved: {} ({}x{})", path_str, frame.width, frame.height);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> DomainResult<Frame> {
        let path_str = path_str(path)?;

        let mat = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR).map_err(|e| {
            tracing::error!("imread failed for {}: {:?}", path_str, e);
            DomainError::BackgroundMissing {
                path: path_str.to_string(),
            }
        })?;

        // imreadは失敗時に空のMatを返す（存在しない・デコード不能の区別はない）
        if mat.empty() {
            return Err(DomainError::BackgroundMissing {
                path: path_str.to_string(),
            });
        }

        mat_convert::mat_to_frame(&mat)
    }

    fn load_resized(&mut self, path: &Path, width: u32, height: u32) -> DomainResult<Frame> {
        let frame = self.load(path)?;
        if frame.width == width && frame.height == height {
            return Ok(frame);
        }

        tracing::info!(
            "Resizing background {}x{} -> {}x{}",
            frame.width,
            frame.height,
            width,
            height
        );

        let src = mat_convert::frame_to_mat(&frame)?;
        let mut resized = Mat::default();
        imgproc::resize(
            &src,
            &mut resized,
            Size::new(width as i32, height as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(|e| DomainError::Process(format!("Failed to resize background: {:?}", e)))?;

        mat_convert::mat_to_frame(&resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdirの作成に失敗");
        // PNGは可逆なのでピクセル値まで比較できる
        let path = dir.path().join("background.png");

        let frame = Frame::solid(16, 8, [200, 100, 50]);
        let mut store = ImageFileStore::new();
        store.save(&path, &frame).expect("保存に失敗");

        let loaded = store.load(&path).expect("読み込みに失敗");
        assert_eq!(loaded.width, 16);
        assert_eq!(loaded.height, 8);
        assert_eq!(loaded.pixel(0, 0), [200, 100, 50]);
        assert_eq!(loaded.pixel(15, 7), [200, 100, 50]);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("tempdirの作成に失敗");
        let path = dir.path().join("background.png");

        let mut store = ImageFileStore::new();
        store
            .save(&path, &Frame::solid(8, 8, [255, 0, 0]))
            .expect("1回目の保存に失敗");
        store
            .save(&path, &Frame::solid(8, 8, [0, 255, 0]))
            .expect("2回目の保存に失敗");

        let loaded = store.load(&path).expect("読み込みに失敗");
        assert_eq!(loaded.pixel(4, 4), [0, 255, 0]);
    }

    #[test]
    fn test_load_missing_file_is_background_missing() {
        let dir = tempfile::tempdir().expect("tempdirの作成に失敗");
        let path = dir.path().join("no_such_file.png");

        let mut store = ImageFileStore::new();
        let result = store.load(&path);
        assert!(matches!(result, Err(DomainError::BackgroundMissing { .. })));
    }

    #[test]
    fn test_load_undecodable_file_is_background_missing() {
        let dir = tempfile::tempdir().expect("tempdirの作成に失敗");
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"this is not an image").expect("書き込みに失敗");

        let mut store = ImageFileStore::new();
        let result = store.load(&path);
        assert!(matches!(result, Err(DomainError::BackgroundMissing { .. })));
    }

    #[test]
    fn test_load_resized_matches_target_dimensions() {
        let dir = tempfile::tempdir().expect("tempdirの作成に失敗");
        let path = dir.path().join("background.png");

        let mut store = ImageFileStore::new();
        store
            .save(&path, &Frame::solid(32, 16, [10, 20, 30]))
            .expect("保存に失敗");

        let resized = store
            .load_resized(&path, 8, 4)
            .expect("リサイズ読み込みに失敗");
        assert_eq!(resized.width, 8);
        assert_eq!(resized.height, 4);
        // 単色画像はリサイズしても単色のまま
        assert_eq!(resized.pixel(3, 2), [10, 20, 30]);
    }
}
