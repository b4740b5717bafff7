//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。
//! デフォルト値は元々ハードコードされていた値と同一で、
//! config.tomlで上書きできる。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult, HsvRange};

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// カメラ設定
    pub camera: CameraConfig,
    /// 背景画像設定
    pub background: BackgroundConfig,
    /// 色マスク設定
    pub mask: MaskConfig,
    /// 表示設定
    pub display: DisplayConfig,
    /// 統計設定
    #[serde(default)]
    pub stats: StatsConfig,
}

/// カメラ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CameraConfig {
    /// カメラデバイスのインデックス
    ///
    /// 通常は0（既定のカメラ）
    pub device_index: i32,

    /// 背景キャプチャ前の待機時間（ミリ秒）
    ///
    /// 撮影者がフレーム外に出るための猶予
    /// デフォルト: 3000ms
    pub warmup_delay_ms: u64,

    /// 合成開始前のウォームアップ時間（ミリ秒）
    ///
    /// Webカメラの露出安定待ち
    /// デフォルト: 1000ms
    pub stream_warmup_ms: u64,
}

impl CameraConfig {
    /// デフォルトの背景キャプチャ待機時間（ミリ秒）
    pub const DEFAULT_WARMUP_DELAY_MS: u64 = 3000;
    /// デフォルトのストリームウォームアップ時間（ミリ秒）
    pub const DEFAULT_STREAM_WARMUP_MS: u64 = 1000;

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    pub fn stream_warmup(&self) -> Duration {
        Duration::from_millis(self.stream_warmup_ms)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            warmup_delay_ms: Self::DEFAULT_WARMUP_DELAY_MS,
            stream_warmup_ms: Self::DEFAULT_STREAM_WARMUP_MS,
        }
    }
}

/// 背景画像設定
///
/// 背景画像はcapture_backgroundが書き込み、HollowManが読み込む
/// 唯一の共有成果物。形式はパスの拡張子で決まる（OpenCVのimwrite準拠）。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackgroundConfig {
    /// 背景画像ファイルのパス
    ///
    /// デフォルト: "background.jpg"
    pub path: String,

    /// キャプチャ直後のプレビュー表示時間（ミリ秒）
    ///
    /// デフォルト: 2000ms
    pub preview_duration_ms: u64,
}

impl BackgroundConfig {
    pub const DEFAULT_PATH: &'static str = "background.jpg";
    pub const DEFAULT_PREVIEW_DURATION_MS: u64 = 2000;

    pub fn preview_duration(&self) -> Duration {
        Duration::from_millis(self.preview_duration_ms)
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            path: Self::DEFAULT_PATH.to_string(),
            preview_duration_ms: Self::DEFAULT_PREVIEW_DURATION_MS,
        }
    }
}

/// HSVレンジ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HsvBandConfig {
    /// H（色相）の最小値
    ///
    /// OpenCV準拠: H [0-180]
    pub h_min: u8,

    /// H（色相）の最大値
    ///
    /// OpenCV準拠: H [0-180]
    pub h_max: u8,

    /// S（彩度）の最小値
    ///
    /// OpenCV準拠: S [0-255]
    pub s_min: u8,

    /// S（彩度）の最大値
    pub s_max: u8,

    /// V（明度）の最小値
    ///
    /// OpenCV準拠: V [0-255]
    pub v_min: u8,

    /// V（明度）の最大値
    pub v_max: u8,
}

impl From<HsvBandConfig> for HsvRange {
    fn from(config: HsvBandConfig) -> Self {
        HsvRange::new(
            config.h_min,
            config.h_max,
            config.s_min,
            config.s_max,
            config.v_min,
            config.v_max,
        )
    }
}

/// 色マスク設定
///
/// 注: hue_bandsはTOMLのテーブル配列になるため、シリアライズ順の都合で
/// スカラー項目より後に置いている。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MaskConfig {
    /// モルフォロジー構造要素のサイズ（奇数、3以上）
    ///
    /// デフォルト: 3（3x3矩形）
    pub kernel_size: i32,

    /// オープニング（収縮→膨張）の反復回数
    ///
    /// 小さな孤立ノイズ領域を除去する。0で無効。
    /// デフォルト: 2
    pub open_iterations: i32,

    /// 追加膨張の反復回数
    ///
    /// マスク内の小さな隙間を埋める。0で無効。
    /// デフォルト: 1
    pub dilate_iterations: i32,

    /// 対象色のHSVレンジリスト（1つ以上）
    ///
    /// 各レンジのマスクの和集合が最終マスクになる。
    /// 色相の折り返し点（H=180→0）をまたぐ色は2つ以上のレンジで表現する。
    /// デフォルト: 赤色の2レンジ（H 0-10 と H 170-180）
    pub hue_bands: Vec<HsvBandConfig>,
}

impl MaskConfig {
    pub const DEFAULT_KERNEL_SIZE: i32 = 3;
    pub const DEFAULT_OPEN_ITERATIONS: i32 = 2;
    pub const DEFAULT_DILATE_ITERATIONS: i32 = 1;

    /// デフォルトの赤色レンジ（折り返し点をまたぐため2レンジ）
    pub fn default_red_bands() -> Vec<HsvBandConfig> {
        vec![
            HsvBandConfig {
                h_min: 0,
                h_max: 10,
                s_min: 120,
                s_max: 255,
                v_min: 70,
                v_max: 255,
            },
            HsvBandConfig {
                h_min: 170,
                h_max: 180,
                s_min: 120,
                s_max: 255,
                v_min: 70,
                v_max: 255,
            },
        ]
    }

    /// Domain型のレンジリストへ変換
    pub fn to_ranges(&self) -> Vec<HsvRange> {
        self.hue_bands.iter().cloned().map(HsvRange::from).collect()
    }
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            kernel_size: Self::DEFAULT_KERNEL_SIZE,
            open_iterations: Self::DEFAULT_OPEN_ITERATIONS,
            dilate_iterations: Self::DEFAULT_DILATE_ITERATIONS,
            hue_bands: Self::default_red_bands(),
        }
    }
}

/// 表示設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DisplayConfig {
    /// 合成結果ウィンドウのタイトル
    pub window_title: String,

    /// マスクウィンドウのタイトル（show_mask有効時のみ使用）
    pub mask_window_title: String,

    /// マスクを別ウィンドウに表示するか（レンジ調整用）
    ///
    /// デフォルト: false
    #[serde(default)]
    pub show_mask: bool,

    /// キー入力ポーリングの待ち時間（ミリ秒）
    ///
    /// 終了キーの応答遅延はこの値で上限づけられる
    /// デフォルト: 5ms
    pub poll_interval_ms: u64,

    /// 終了キー（1文字）
    ///
    /// ESCキーでも終了できる
    /// デフォルト: "q"
    pub quit_key: char,
}

impl DisplayConfig {
    pub const DEFAULT_WINDOW_TITLE: &'static str = "Invisible Cloak Effect";
    pub const DEFAULT_MASK_WINDOW_TITLE: &'static str = "Cloak Mask";
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;
    pub const DEFAULT_QUIT_KEY: char = 'q';

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: Self::DEFAULT_WINDOW_TITLE.to_string(),
            mask_window_title: Self::DEFAULT_MASK_WINDOW_TITLE.to_string(),
            show_mask: false,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
            quit_key: Self::DEFAULT_QUIT_KEY,
        }
    }
}

/// 統計設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatsConfig {
    /// 統計情報の出力間隔（秒）
    pub report_interval_sec: u64,
}

impl StatsConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_sec)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            report_interval_sec: 10,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // レンジリストの検証
        if self.mask.hue_bands.is_empty() {
            return Err(DomainError::Configuration(
                "At least one HSV band is required".to_string(),
            ));
        }
        for band in &self.mask.hue_bands {
            if band.h_min > 180 || band.h_max > 180 || band.h_min > band.h_max {
                return Err(DomainError::Configuration(
                    "Invalid HSV H range (must be 0-180, min <= max)".to_string(),
                ));
            }
            if band.s_min > band.s_max || band.v_min > band.v_max {
                return Err(DomainError::Configuration(
                    "Invalid HSV S/V range (min must be <= max)".to_string(),
                ));
            }
        }

        // 構造要素の検証
        if self.mask.kernel_size < 3 || self.mask.kernel_size % 2 == 0 {
            return Err(DomainError::Configuration(
                "Kernel size must be an odd number >= 3".to_string(),
            ));
        }
        if self.mask.open_iterations < 0 || self.mask.dilate_iterations < 0 {
            return Err(DomainError::Configuration(
                "Morphology iterations must be non-negative".to_string(),
            ));
        }

        // 表示設定の検証
        if self.display.poll_interval_ms == 0 {
            return Err(DomainError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        if !self.display.quit_key.is_ascii() {
            return Err(DomainError::Configuration(
                "Quit key must be an ASCII character".to_string(),
            ));
        }

        // 背景パスの検証
        if self.background.path.is_empty() {
            return Err(DomainError::Configuration(
                "Background path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
