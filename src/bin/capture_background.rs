//! 背景キャプチャバイナリ
//!
//! カメラから背景フレームを1枚取得して保存する。
//! 保存した背景は合成バイナリ（HollowMan）が読み込む。
//!
//! 実行方法:
//! ```
//! cargo run --bin capture_background
//! ```

use std::path::PathBuf;

use HollowMan::application::capture::{CaptureJob, CaptureJobConfig};
use HollowMan::domain::config::AppConfig;
use HollowMan::infrastructure::background_store::ImageFileStore;
use HollowMan::infrastructure::camera::VideoCaptureAdapter;
use HollowMan::infrastructure::display::HighguiDisplay;
use HollowMan::logging::init_logging;

fn main() {
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));

    tracing::info!("capture_background starting...");

    match run() {
        Ok(_) => {
            tracing::info!("capture_background terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    config.validate()?;

    // カメラが開けない場合はフレーム読み取りにも保存にも進まない
    tracing::info!("Opening camera...");
    let capture = VideoCaptureAdapter::open(config.camera.device_index)?;

    let store = ImageFileStore::new();
    let display = HighguiDisplay::new();

    let job_config = CaptureJobConfig::from(&config);
    let job = CaptureJob::new(capture, store, display, job_config);
    job.run()?;

    Ok(())
}
