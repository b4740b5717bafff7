use std::path::PathBuf;

use HollowMan::application::pipeline::{CloakPipeline, PipelineConfig};
use HollowMan::domain::config::AppConfig;
use HollowMan::domain::ports::CapturePort; // traitメソッド使用のため
use HollowMan::infrastructure::background_store::ImageFileStore;
use HollowMan::infrastructure::camera::VideoCaptureAdapter;
use HollowMan::infrastructure::color_process::ChromaMaskProcessor;
use HollowMan::infrastructure::display::HighguiDisplay;
use HollowMan::logging::init_logging;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("HollowMan starting...");

    match run() {
        Ok(_) => {
            tracing::info!("HollowMan terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> Result<(), Box<dyn std::error::Error>> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
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

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Camera: index={}, stream warmup={}ms",
        config.camera.device_index,
        config.camera.stream_warmup_ms
    );
    tracing::info!(
        "Mask: {} band(s), kernel={}x{}, open={}, dilate={}",
        config.mask.hue_bands.len(),
        config.mask.kernel_size,
        config.mask.kernel_size,
        config.mask.open_iterations,
        config.mask.dilate_iterations
    );
    tracing::info!("Background artifact: {}", config.background.path);

    // カメラアダプタの初期化（失敗時はフレーム読み取りに進まない）
    tracing::info!("Opening camera...");
    let capture = VideoCaptureAdapter::open(config.camera.device_index)?;

    let device_info = capture.device_info();
    tracing::info!(
        "Camera ready: {}x{} - {}",
        device_info.width,
        device_info.height,
        device_info.name
    );

    // 処理・入出力アダプタの初期化
    let processor = ChromaMaskProcessor::from_config(&config.mask)?;
    let store = ImageFileStore::new();
    let display = HighguiDisplay::new();

    let pipeline_config = PipelineConfig::from(&config);

    tracing::info!("Starting single-threaded composite loop...");
    tracing::info!(
        "Press '{}' or ESC in the preview window to quit",
        config.display.quit_key
    );

    // パイプラインの起動（ブロッキング）
    let pipeline = CloakPipeline::new(capture, processor, store, display, pipeline_config);
    pipeline.run()?;

    Ok(())
}
