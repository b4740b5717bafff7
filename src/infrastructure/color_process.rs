/// 色マスク・合成処理アダプタ
///
/// OpenCVを使用したHSV色空間でのマスク生成と背景置き換え合成の実装。
///
/// 処理の流れ:
/// 1. BGR → HSV変換
/// 2. 各HSVレンジでin_range、結果をbitwise_orで和集合に
/// 3. オープニング（収縮→膨張）でノイズ除去、追加膨張で隙間を埋める
/// 4. output = (live & !mask) + (background & mask)

use crate::domain::{
    CompositePort, DomainError, DomainResult, Frame, HsvRange, Mask, MaskConfig, MaskPort,
};
use crate::infrastructure::mat_convert;
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    imgproc,
    prelude::*,
};

/// 色マスク・合成処理アダプタ
pub struct ChromaMaskProcessor {
    kernel: Mat,
    open_iterations: i32,
    dilate_iterations: i32,
}

impl ChromaMaskProcessor {
    /// 新しい処理アダプタを作成
    ///
    /// # Arguments
    /// - `kernel_size`: 構造要素のサイズ（奇数、3以上）
    /// - `open_iterations`: オープニングの反復回数（0で無効）
    /// - `dilate_iterations`: 追加膨張の反復回数（0で無効）
    pub fn new(
        kernel_size: i32,
        open_iterations: i32,
        dilate_iterations: i32,
    ) -> DomainResult<Self> {
        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            Size::new(kernel_size, kernel_size),
            Point::new(-1, -1),
        )
        .map_err(|e| DomainError::Process(format!("Failed to create kernel: {:?}", e)))?;

        Ok(Self {
            kernel,
            open_iterations,
            dilate_iterations,
        })
    }

    /// 設定から処理アダプタを作成
    pub fn from_config(config: &MaskConfig) -> DomainResult<Self> {
        Self::new(
            config.kernel_size,
            config.open_iterations,
            config.dilate_iterations,
        )
    }

    /// BGR画像から対象色のマスクMatを生成
    fn build_mask(&self, bgr: &Mat, bands: &[HsvRange]) -> DomainResult<Mat> {
        // BGR → HSV変換
        let mut hsv = Mat::default();
        imgproc::cvt_color(bgr, &mut hsv, imgproc::COLOR_BGR2HSV, 0)
            .map_err(|e| DomainError::Process(format!("Failed to convert BGR to HSV: {:?}", e)))?;

        // 各レンジのマスクを和集合に（境界値は両端とも含む）
        let mut union: Option<Mat> = None;
        for band in bands {
            let lower = Scalar::new(
                band.h_min as f64,
                band.s_min as f64,
                band.v_min as f64,
                0.0,
            );
            let upper = Scalar::new(
                band.h_max as f64,
                band.s_max as f64,
                band.v_max as f64,
                0.0,
            );

            let mut band_mask = Mat::default();
            core::in_range(&hsv, &lower, &upper, &mut band_mask)
                .map_err(|e| DomainError::Process(format!("Failed to create mask: {:?}", e)))?;

            union = Some(match union {
                None => band_mask,
                Some(acc) => {
                    let mut merged = Mat::default();
                    core::bitwise_or(&acc, &band_mask, &mut merged, &core::no_array()).map_err(
                        |e| DomainError::Process(format!("Failed to merge masks: {:?}", e)),
                    )?;
                    merged
                }
            });
        }

        let mask = union.ok_or_else(|| {
            DomainError::Process("At least one HSV band is required".to_string())
        })?;

        self.clean(&mask)
    }

    /// マスクのモルフォロジー整形（オープニング→膨張）
    fn clean(&self, mask: &Mat) -> DomainResult<Mat> {
        let border_value = imgproc::morphology_default_border_value()
            .map_err(|e| DomainError::Process(format!("Failed to get border value: {:?}", e)))?;

        let mut cleaned = mask
            .try_clone()
            .map_err(|e| DomainError::Process(format!("Failed to clone mask: {:?}", e)))?;

        if self.open_iterations > 0 {
            let mut opened = Mat::default();
            imgproc::morphology_ex(
                &cleaned,
                &mut opened,
                imgproc::MORPH_OPEN,
                &self.kernel,
                Point::new(-1, -1),
                self.open_iterations,
                core::BORDER_CONSTANT,
                border_value,
            )
            .map_err(|e| DomainError::Process(format!("Failed to open mask: {:?}", e)))?;
            cleaned = opened;
        }

        if self.dilate_iterations > 0 {
            let mut dilated = Mat::default();
            imgproc::morphology_ex(
                &cleaned,
                &mut dilated,
                imgproc::MORPH_DILATE,
                &self.kernel,
                Point::new(-1, -1),
                self.dilate_iterations,
                core::BORDER_CONSTANT,
                border_value,
            )
            .map_err(|e| DomainError::Process(format!("Failed to dilate mask: {:?}", e)))?;
            cleaned = dilated;
        }

        Ok(cleaned)
    }

    /// 既存マスクにモルフォロジー整形のみ適用
    ///
    /// レンジ調整時の確認用。オープニングは自身の出力に対して冪等であり、
    /// 再適用による変化は追加膨張の分（構造要素半径×反復回数）に限られる。
    pub fn clean_mask(&self, mask: &Mask) -> DomainResult<Mask> {
        let mat = mat_convert::mask_to_mat(mask)?;
        let cleaned = self.clean(&mat)?;
        mat_convert::mat_to_mask(&cleaned)
    }

    /// マスクを指定して合成のみ実行
    ///
    /// output = (live & !mask) + (background & mask)
    pub fn composite_with_mask(
        &self,
        live: &Frame,
        background: &Frame,
        mask: &Mask,
    ) -> DomainResult<Frame> {
        check_dimensions(live, background)?;

        let live_mat = mat_convert::frame_to_mat(live)?;
        let bg_mat = mat_convert::frame_to_mat(background)?;
        let mask_mat = mat_convert::mask_to_mat(mask)?;

        let output = blend(&live_mat, &bg_mat, &mask_mat)?;
        mat_convert::mat_to_frame(&output)
    }
}

impl MaskPort for ChromaMaskProcessor {
    fn mask_frame(&mut self, frame: &Frame, bands: &[HsvRange]) -> DomainResult<Mask> {
        let bgr = mat_convert::frame_to_mat(frame)?;
        let mask = self.build_mask(&bgr, bands)?;
        mat_convert::mat_to_mask(&mask)
    }
}

impl CompositePort for ChromaMaskProcessor {
    fn composite(
        &mut self,
        live: &Frame,
        background: &Frame,
        bands: &[HsvRange],
    ) -> DomainResult<Frame> {
        check_dimensions(live, background)?;

        let live_mat = mat_convert::frame_to_mat(live)?;
        let bg_mat = mat_convert::frame_to_mat(background)?;
        let mask = self.build_mask(&live_mat, bands)?;

        let output = blend(&live_mat, &bg_mat, &mask)?;
        mat_convert::mat_to_frame(&output)
    }
}

/// サイズ不一致は暗黙の切り抜き・伸縮をせず即座にエラー
fn check_dimensions(live: &Frame, background: &Frame) -> DomainResult<()> {
    if !live.same_dimensions(background) {
        return Err(DomainError::DimensionMismatch {
            frame_width: live.width,
            frame_height: live.height,
            background_width: background.width,
            background_height: background.height,
        });
    }
    Ok(())
}

/// マスクに基づく置き換え合成
fn blend(live: &Mat, background: &Mat, mask: &Mat) -> DomainResult<Mat> {
    let mut mask_inv = Mat::default();
    core::bitwise_not(mask, &mut mask_inv, &core::no_array())
        .map_err(|e| DomainError::Process(format!("Failed to invert mask: {:?}", e)))?;

    let mut live_part = Mat::default();
    core::bitwise_and(live, live, &mut live_part, &mask_inv)
        .map_err(|e| DomainError::Process(format!("Failed to mask live frame: {:?}", e)))?;

    let mut bg_part = Mat::default();
    core::bitwise_and(background, background, &mut bg_part, mask)
        .map_err(|e| DomainError::Process(format!("Failed to mask background: {:?}", e)))?;

    let mut output = Mat::default();
    core::add(&live_part, &bg_part, &mut output, &core::no_array(), -1)
        .map_err(|e| DomainError::Process(format!("Failed to blend parts: {:?}", e)))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> ChromaMaskProcessor {
        ChromaMaskProcessor::new(3, 2, 1).expect("processorの作成に失敗")
    }

    #[test]
    fn test_composite_with_zero_mask_keeps_live() {
        // 全ゼロマスク: 出力はライブフレームそのもの
        let live = Frame::solid(8, 8, [10, 20, 30]);
        let background = Frame::solid(8, 8, [200, 100, 50]);
        let mask = Mask::new(vec![0u8; 64], 8, 8);

        let out = processor()
            .composite_with_mask(&live, &background, &mask)
            .expect("合成に失敗");
        assert_eq!(out.data, live.data);
    }

    #[test]
    fn test_composite_with_full_mask_shows_background() {
        // 全1マスク: 出力は背景そのもの
        let live = Frame::solid(8, 8, [10, 20, 30]);
        let background = Frame::solid(8, 8, [200, 100, 50]);
        let mask = Mask::new(vec![255u8; 64], 8, 8);

        let out = processor()
            .composite_with_mask(&live, &background, &mask)
            .expect("合成に失敗");
        assert_eq!(out.data, background.data);
    }

    #[test]
    fn test_composite_rejects_dimension_mismatch() {
        let live = Frame::solid(4, 4, [0, 0, 0]);
        let background = Frame::solid(8, 8, [0, 0, 0]);

        let result = processor().composite(&live, &background, &[HsvRange::new(0, 10, 120, 255, 70, 255)]);
        assert!(matches!(
            result,
            Err(DomainError::DimensionMismatch {
                frame_width: 4,
                frame_height: 4,
                background_width: 8,
                background_height: 8,
            })
        ));
    }

    #[test]
    fn test_clean_noop_when_iterations_zero() {
        let processor = ChromaMaskProcessor::new(3, 0, 0).expect("processorの作成に失敗");
        let mut data = vec![0u8; 36];
        data[14] = 255; // 孤立ピクセル
        let mask = Mask::new(data, 6, 6);

        let cleaned = processor.clean_mask(&mask).expect("整形に失敗");
        assert_eq!(cleaned, mask);
    }

    #[test]
    fn test_open_removes_isolated_pixel() {
        // 3x3カーネルのオープニングは孤立した1ピクセルを除去する
        let processor = ChromaMaskProcessor::new(3, 2, 1).expect("processorの作成に失敗");
        let mut data = vec![0u8; 100];
        data[55] = 255;
        let mask = Mask::new(data, 10, 10);

        let cleaned = processor.clean_mask(&mask).expect("整形に失敗");
        assert_eq!(cleaned.coverage(), 0);
    }
}
