/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// OpenCV型には依存せず、Infrastructure層がMatとの変換を担当する。

use std::time::Instant;

/// キャプチャされたフレームデータ（BGR形式、連続メモリ）
#[derive(Debug, Clone)]
pub struct Frame {
    /// フレーム取得時刻
    pub timestamp: Instant,
    /// 画像データ（BGR、行優先、長さ = width * height * 3）
    pub data: Vec<u8>,
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
}

impl Frame {
    /// 新しいフレームを作成
    ///
    /// dataの長さは width * height * 3 であること。
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            timestamp: Instant::now(),
            data,
            width,
            height,
        }
    }

    /// 単色（BGR）で塗りつぶしたフレームを作成
    ///
    /// テストや初期化用。
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&bgr);
        }
        Self::new(data, width, height)
    }

    /// 指定ピクセルのBGR値を取得
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 3) as usize;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// 指定ピクセルにBGR値を設定
    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        let idx = ((y * self.width + x) * 3) as usize;
        self.data[idx..idx + 3].copy_from_slice(&bgr);
    }

    /// 背景画像とのサイズ一致を確認
    pub fn same_dimensions(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// 2値マスク（1チャンネル、0 = 非対象 / 255 = 対象色）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    /// マスクデータ（行優先、長さ = width * height）
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Mask {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// 対象色としてマークされたピクセル数
    pub fn coverage(&self) -> u32 {
        self.data.iter().filter(|&&v| v != 0).count() as u32
    }

    /// 指定ピクセルがマークされているか
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize] != 0
    }
}

/// HSV色空間のレンジ（OpenCV準拠: H[0-180], S[0-255], V[0-255]）
///
/// 境界値は両端とも含む（inclusive）。
///
/// 色相は循環するため、折り返し点（H=180→0）をまたぐ色（赤など）は
/// 単一レンジでは表現できない。そのような色は複数のレンジのリストで
/// 表現し、和集合としてマスクを作る。レンジ数に制限はない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl HsvRange {
    /// 新しいHSVレンジを作成
    pub fn new(h_min: u8, h_max: u8, s_min: u8, s_max: u8, v_min: u8, v_max: u8) -> Self {
        Self {
            h_min,
            h_max,
            s_min,
            s_max,
            v_min,
            v_max,
        }
    }

    /// OpenCVのScalar形式で下限を取得 [H, S, V]
    pub fn lower_bound(&self) -> [u8; 3] {
        [self.h_min, self.s_min, self.v_min]
    }

    /// OpenCVのScalar形式で上限を取得 [H, S, V]
    pub fn upper_bound(&self) -> [u8; 3] {
        [self.h_max, self.s_max, self.v_max]
    }

    /// HSV値がこのレンジに含まれるか（境界値を含む）
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        self.h_min <= h
            && h <= self.h_max
            && self.s_min <= s
            && s <= self.s_max
            && self.v_min <= v
            && v <= self.v_max
    }
}

/// HSV値がレンジリストのいずれかに含まれるか（和集合）
pub fn any_range_contains(ranges: &[HsvRange], h: u8, s: u8, v: u8) -> bool {
    ranges.iter().any(|r| r.contains(h, s, v))
}
