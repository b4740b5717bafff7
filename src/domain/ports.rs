/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。
///
/// パイプラインは単一スレッド・ブロッキングI/Oで動作するため、
/// Send/Sync境界は課さない。

use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainResult, Frame, HsvRange, Mask};

/// キャプチャポート: カメラフレームの取得を抽象化
///
/// デバイスハンドルはアダプタが所有し、アダプタのDropで必ず解放される。
/// 正常終了・キー押下・読み取り失敗のどの経路でも解放は一度だけ行われる。
pub trait CapturePort {
    /// フレームを1枚読み取る（ブロッキング）
    ///
    /// デバイスがフレームを返すまでブロックする。タイムアウトは設けない。
    ///
    /// # Returns
    /// - `Ok(Frame)`: 読み取り成功（BGR形式）
    /// - `Err(DomainError::CaptureFailed)`: readがフレームを返さなかった
    fn read_frame(&mut self) -> DomainResult<Frame>;

    /// キャプチャデバイスの情報を取得
    fn device_info(&self) -> DeviceInfo;
}

/// デバイス情報
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub width: u32,
    pub height: u32,
    pub name: String,
}

/// マスクポート: 対象色マスクの生成を抽象化
pub trait MaskPort {
    /// フレームから対象色の2値マスクを生成する
    ///
    /// マスクは各レンジのin_range結果の和集合に、
    /// モルフォロジーによるノイズ除去（オープニング→膨張）を適用したもの。
    ///
    /// # Arguments
    /// - `frame`: 処理対象のフレーム（BGR）
    /// - `bands`: 対象色のHSVレンジリスト（1つ以上）
    fn mask_frame(&mut self, frame: &Frame, bands: &[HsvRange]) -> DomainResult<Mask>;
}

/// 合成ポート: フレーム単位の置き換え合成を抽象化
pub trait CompositePort {
    /// 対象色領域を背景画像で置き換えた出力フレームを生成する
    ///
    /// output = (live & !mask) + (background & mask)
    ///
    /// # Returns
    /// - `Ok(Frame)`: 合成結果
    /// - `Err(DomainError::DimensionMismatch)`: サイズ不一致（暗黙の伸縮はしない）
    fn composite(
        &mut self,
        live: &Frame,
        background: &Frame,
        bands: &[HsvRange],
    ) -> DomainResult<Frame>;
}

/// 背景ストアポート: 背景画像ファイルの読み書きを抽象化
///
/// 背景画像は2つの実行バイナリをつなぐ唯一の外部成果物。
/// パスと形式は設定で宣言される（デフォルト: background.jpg）。
pub trait BackgroundStorePort {
    /// フレームを背景画像として保存する（既存ファイルは上書き）
    fn save(&mut self, path: &Path, frame: &Frame) -> DomainResult<()>;

    /// 背景画像を読み込む
    ///
    /// # Returns
    /// - `Err(DomainError::BackgroundMissing)`: ファイルが存在しない、またはデコード不能
    fn load(&mut self, path: &Path) -> DomainResult<Frame>;

    /// 背景画像を読み込み、指定サイズにリサイズして返す
    fn load_resized(&mut self, path: &Path, width: u32, height: u32) -> DomainResult<Frame>;
}

/// 表示ポート: プレビューウィンドウとキー入力を抽象化
///
/// ウィンドウはアダプタのDropで破棄される。
pub trait DisplayPort {
    /// フレームをウィンドウに表示する
    fn show(&mut self, window: &str, frame: &Frame) -> DomainResult<()>;

    /// マスクをウィンドウに表示する（調整用）
    fn show_mask(&mut self, window: &str, mask: &Mask) -> DomainResult<()>;

    /// キー入力を待つ
    ///
    /// 指定時間だけブロックし、押されたキーのコードを返す。
    /// キャンセルはこのポーリングでのみ検出されるため、
    /// 終了の応答遅延は待ち時間で上限づけられる。
    ///
    /// # Returns
    /// - `Ok(Some(code))`: キーが押された
    /// - `Ok(None)`: 時間内にキー入力なし
    fn poll_key(&mut self, wait: Duration) -> DomainResult<Option<i32>>;
}
