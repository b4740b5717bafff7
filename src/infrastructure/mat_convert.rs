//! Domain型とOpenCV Matの相互変換
//!
//! キャプチャ・処理・表示の各アダプタで共用される変換ユーティリティ。

use crate::domain::{DomainError, DomainResult, Frame, Mask};
use opencv::{
    core::{self, Mat},
    prelude::*,
};

/// FrameをBGR形式のMatに変換
pub(crate) fn frame_to_mat(frame: &Frame) -> DomainResult<Mat> {
    let expected = (frame.width as usize) * (frame.height as usize) * 3;
    if frame.data.len() != expected {
        return Err(DomainError::Process(format!(
            "Frame buffer length {} does not match {}x{}x3",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let flat = Mat::from_slice(frame.data.as_slice())
        .map_err(|e| DomainError::Process(format!("Failed to create Mat: {:?}", e)))?;
    let shaped = flat
        .reshape(3, frame.height as i32)
        .map_err(|e| DomainError::Process(format!("Failed to reshape Mat: {:?}", e)))?;
    shaped
        .try_clone()
        .map_err(|e| DomainError::Process(format!("Failed to clone Mat: {:?}", e)))
}

/// Maskを1チャンネルのMatに変換
pub(crate) fn mask_to_mat(mask: &Mask) -> DomainResult<Mat> {
    let expected = (mask.width as usize) * (mask.height as usize);
    if mask.data.len() != expected {
        return Err(DomainError::Process(format!(
            "Mask buffer length {} does not match {}x{}",
            mask.data.len(),
            mask.width,
            mask.height
        )));
    }

    let flat = Mat::from_slice(mask.data.as_slice())
        .map_err(|e| DomainError::Process(format!("Failed to create Mat: {:?}", e)))?;
    let shaped = flat
        .reshape(1, mask.height as i32)
        .map_err(|e| DomainError::Process(format!("Failed to reshape Mat: {:?}", e)))?;
    shaped
        .try_clone()
        .map_err(|e| DomainError::Process(format!("Failed to clone Mat: {:?}", e)))
}

/// BGR形式のMatをFrameに変換
pub(crate) fn mat_to_frame(mat: &Mat) -> DomainResult<Frame> {
    if mat.typ() != core::CV_8UC3 {
        return Err(DomainError::Process(format!(
            "Unexpected Mat type {} (expected CV_8UC3)",
            mat.typ()
        )));
    }

    let owned;
    let continuous = if mat.is_continuous() {
        mat
    } else {
        owned = mat
            .try_clone()
            .map_err(|e| DomainError::Process(format!("Failed to clone Mat: {:?}", e)))?;
        &owned
    };

    let data = continuous
        .data_bytes()
        .map_err(|e| DomainError::Process(format!("Failed to read Mat data: {:?}", e)))?
        .to_vec();

    Ok(Frame::new(data, mat.cols() as u32, mat.rows() as u32))
}

/// 1チャンネルのMatをMaskに変換
pub(crate) fn mat_to_mask(mat: &Mat) -> DomainResult<Mask> {
    if mat.typ() != core::CV_8UC1 {
        return Err(DomainError::Process(format!(
            "Unexpected Mat type {} (expected CV_8UC1)",
            mat.typ()
        )));
    }

    let owned;
    let continuous = if mat.is_continuous() {
        mat
    } else {
        owned = mat
            .try_clone()
            .map_err(|e| DomainError::Process(format!("Failed to clone Mat: {:?}", e)))?;
        &owned
    };

    let data = continuous
        .data_bytes()
        .map_err(|e| DomainError::Process(format!("Failed to read Mat data: {:?}", e)))?
        .to_vec();

    Ok(Mask::new(data, mat.cols() as u32, mat.rows() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_mat_roundtrip() {
        let mut frame = Frame::solid(4, 3, [10, 20, 30]);
        frame.set_pixel(2, 1, [1, 2, 3]);

        let mat = frame_to_mat(&frame).expect("Matへの変換に失敗");
        assert_eq!(mat.cols(), 4);
        assert_eq!(mat.rows(), 3);
        assert_eq!(mat.typ(), core::CV_8UC3);

        let back = mat_to_frame(&mat).expect("Frameへの変換に失敗");
        assert_eq!(back.data, frame.data);
        assert_eq!(back.pixel(2, 1), [1, 2, 3]);
    }

    #[test]
    fn test_mask_mat_roundtrip() {
        let mask = Mask::new(vec![0, 255, 255, 0, 255, 0], 3, 2);

        let mat = mask_to_mat(&mask).expect("Matへの変換に失敗");
        assert_eq!(mat.typ(), core::CV_8UC1);

        let back = mat_to_mask(&mat).expect("Maskへの変換に失敗");
        assert_eq!(back, mask);
    }

    #[test]
    fn test_frame_to_mat_rejects_bad_length() {
        let frame = Frame {
            timestamp: std::time::Instant::now(),
            data: vec![0u8; 10],
            width: 4,
            height: 3,
        };
        assert!(frame_to_mat(&frame).is_err());
    }
}
