/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - 全てのエラーは終了条件。リトライや部分回復は行わず、
///   呼び出し側がログ出力してリソースを解放し、停止する

use thiserror::Error;

/// Domain層の統一エラー型
#[derive(Error, Debug)]
pub enum DomainError {
    /// カメラデバイスが開けない
    ///
    /// 起動時にのみ発生する。この時点ではフレーム読み取りも
    /// 背景ファイル書き込みも行われない。
    #[error("Camera device unavailable (index {index})")]
    DeviceUnavailable { index: i32 },

    /// フレーム読み取り失敗（readがフレームを返さなかった）
    #[error("Frame capture failed")]
    CaptureFailed,

    /// 背景画像ファイルが存在しない、またはデコードできない
    #[error("Background image missing or unreadable: {path}")]
    BackgroundMissing { path: String },

    /// ライブフレームと背景画像のサイズ不一致
    ///
    /// 起動時のリサイズ後にサイズが食い違った場合、暗黙の切り抜きや
    /// 伸縮はせず、このエラーで即座に停止する。
    #[error("Frame {frame_width}x{frame_height} does not match background {background_width}x{background_height}")]
    DimensionMismatch {
        frame_width: u32,
        frame_height: u32,
        background_width: u32,
        background_height: u32,
    },

    /// 設定関連のエラー
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 画像処理関連のエラー
    #[error("Process error: {0}")]
    Process(String),

    /// 背景画像ファイルの読み書きエラー
    #[error("Background store error: {0}")]
    Store(String),

    /// 表示ウィンドウ関連のエラー
    #[error("Display error: {0}")]
    Display(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
