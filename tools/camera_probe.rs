//! カメラ診断ツール
//!
//! カメラを開いて1フレーム読み取れるかだけを確認する外部スモークテスト。
//! パイプラインの契約には含まれない。
//!
//! 実行方法:
//! ```
//! cargo run --bin camera_probe
//! ```

use anyhow::{Context, Result};
use HollowMan::domain::config::AppConfig;
use HollowMan::domain::ports::CapturePort;
use HollowMan::infrastructure::camera::VideoCaptureAdapter;

fn main() -> Result<()> {
    let config = AppConfig::from_file("config.toml").unwrap_or_default();

    let mut capture = VideoCaptureAdapter::open(config.camera.device_index)
        .context("Camera NOT opening")?;

    let info = capture.device_info();
    println!(
        "Camera opened: {}x{} - {}",
        info.width, info.height, info.name
    );

    match capture.read_frame() {
        Ok(frame) => println!("Frame read: true ({}x{})", frame.width, frame.height),
        Err(e) => println!("Frame read: false ({})", e),
    }

    // captureのDropがデバイスを解放する
    Ok(())
}
