//! 合成パイプライン制御モジュール
//!
//! 単一スレッドのフレームループで Init → Streaming → Terminated の
//! 状態遷移を制御します。並行処理はなく、カメラ読み取りはブロッキング、
//! キャンセルはキー入力のポーリングのみです。

use crate::application::stats::{StatKind, StatsCollector};
use crate::domain::{
    config::AppConfig,
    error::DomainResult,
    ports::{BackgroundStorePort, CapturePort, CompositePort, DisplayPort, MaskPort},
    types::{Frame, HsvRange},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// ESCキーのコード
const KEY_ESC: i32 = 27;

/// パイプライン設定
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 背景画像のパス
    pub background_path: PathBuf,
    /// 対象色のHSVレンジリスト
    pub hue_bands: Vec<HsvRange>,
    /// 合成開始前のウォームアップ時間
    pub stream_warmup: Duration,
    /// キー入力ポーリングの待ち時間
    pub poll_interval: Duration,
    /// 終了キー（ESCでも終了できる）
    pub quit_key: char,
    /// マスクを別ウィンドウに表示するか
    pub show_mask: bool,
    /// 合成結果ウィンドウのタイトル
    pub window_title: String,
    /// マスクウィンドウのタイトル
    pub mask_window_title: String,
    /// 統計出力間隔
    pub stats_interval: Duration,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            background_path: PathBuf::from(&config.background.path),
            hue_bands: config.mask.to_ranges(),
            stream_warmup: config.camera.stream_warmup(),
            poll_interval: config.display.poll_interval(),
            quit_key: config.display.quit_key,
            show_mask: config.display.show_mask,
            window_title: config.display.window_title.clone(),
            mask_window_title: config.display.mask_window_title.clone(),
            stats_interval: config.stats.report_interval(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// パイプラインの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Streaming,
    Terminated,
}

/// 合成パイプライン実行コンテキスト
///
/// アダプタはパイプラインが所有し、runの終了とともにDropされる。
/// カメラ解放とウィンドウ破棄は正常終了・キー押下・読み取り失敗の
/// どの経路でも必ず一度だけ行われる。
pub struct CloakPipeline<C, P, S, D>
where
    C: CapturePort,
    P: MaskPort + CompositePort,
    S: BackgroundStorePort,
    D: DisplayPort,
{
    capture: C,
    processor: P,
    store: S,
    display: D,
    config: PipelineConfig,
    stats: StatsCollector,
    phase: Phase,
}

impl<C, P, S, D> CloakPipeline<C, P, S, D>
where
    C: CapturePort,
    P: MaskPort + CompositePort,
    S: BackgroundStorePort,
    D: DisplayPort,
{
    /// 新しいパイプラインを作成
    pub fn new(capture: C, processor: P, store: S, display: D, config: PipelineConfig) -> Self {
        Self {
            capture,
            processor,
            store,
            display,
            stats: StatsCollector::new(config.stats_interval),
            config,
            phase: Phase::Init,
        }
    }

    /// パイプラインを起動（ブロッキング）
    ///
    /// 終了キーか読み取り失敗でストリームが止まるまで戻らない。
    pub fn run(mut self) -> DomainResult<()> {
        let background = self.init()?;
        self.transition(Phase::Streaming);

        self.stream(&background)?;
        self.transition(Phase::Terminated);

        // selfのDropがカメラとウィンドウを解放する
        Ok(())
    }

    /// Init状態: サイズ確定と背景読み込み
    fn init(&mut self) -> DomainResult<Frame> {
        if !self.config.stream_warmup.is_zero() {
            tracing::info!("Warming up camera for {:?}...", self.config.stream_warmup);
            std::thread::sleep(self.config.stream_warmup);
        }

        // 1フレーム読んで出力サイズを確定する
        let probe = self.capture.read_frame()?;
        tracing::info!("Stream dimensions: {}x{}", probe.width, probe.height);

        // 背景をストリームサイズに合わせる
        let background = self.store.load_resized(
            &self.config.background_path,
            probe.width,
            probe.height,
        )?;

        Ok(background)
    }

    /// Streaming状態: フレームループ
    fn stream(&mut self, background: &Frame) -> DomainResult<()> {
        let quit_code = self.config.quit_key as i32;

        loop {
            let loop_start = Instant::now();

            let frame = match self.capture.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    // ストリーム中の読み取り失敗はクラッシュではなく正常停止
                    tracing::warn!("Frame read failed, stopping stream: {}", e);
                    break;
                }
            };
            let captured_at = Instant::now();
            self.stats
                .record_duration(StatKind::Capture, captured_at.duration_since(loop_start));

            let output = crate::measure_span!("composite", {
                self.processor
                    .composite(&frame, background, &self.config.hue_bands)
            })?;
            let composited_at = Instant::now();
            self.stats.record_duration(
                StatKind::Composite,
                composited_at.duration_since(captured_at),
            );

            self.display.show(&self.config.window_title, &output)?;
            if self.config.show_mask {
                // レンジ調整用の別ウィンドウ。マスクの再計算はこの経路のみ
                let mask = self
                    .processor
                    .mask_frame(&frame, &self.config.hue_bands)?;
                self.display
                    .show_mask(&self.config.mask_window_title, &mask)?;
            }
            let displayed_at = Instant::now();
            self.stats.record_duration(
                StatKind::Display,
                displayed_at.duration_since(composited_at),
            );
            self.stats
                .record_duration(StatKind::EndToEnd, displayed_at.duration_since(loop_start));
            self.stats.record_frame();

            if self.stats.should_report() {
                self.stats.report_and_reset();
            }

            // キャンセルはこのポーリングのみ。応答遅延はpoll_intervalで上限づけられる
            if let Some(key) = self.display.poll_key(self.config.poll_interval)? {
                if key == quit_code || key == KEY_ESC {
                    tracing::info!("Quit key pressed, stopping stream");
                    break;
                }
            }
        }

        Ok(())
    }

    fn transition(&mut self, next: Phase) {
        tracing::info!("Pipeline state: {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        error::DomainError,
        ports::DeviceInfo,
        types::{HsvRange, Mask},
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // モック実装
    struct MockCapture {
        frames_before_failure: usize,
    }

    impl CapturePort for MockCapture {
        fn read_frame(&mut self) -> DomainResult<Frame> {
            if self.frames_before_failure == 0 {
                return Err(DomainError::CaptureFailed);
            }
            self.frames_before_failure -= 1;
            Ok(Frame::solid(4, 4, [255, 0, 0]))
        }

        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                width: 4,
                height: 4,
                name: "Mock Camera".to_string(),
            }
        }
    }

    struct MockProcessor;

    impl MaskPort for MockProcessor {
        fn mask_frame(&mut self, frame: &Frame, _bands: &[HsvRange]) -> DomainResult<Mask> {
            Ok(Mask::new(
                vec![0u8; (frame.width * frame.height) as usize],
                frame.width,
                frame.height,
            ))
        }
    }

    impl CompositePort for MockProcessor {
        fn composite(
            &mut self,
            live: &Frame,
            background: &Frame,
            _bands: &[HsvRange],
        ) -> DomainResult<Frame> {
            if !live.same_dimensions(background) {
                return Err(DomainError::DimensionMismatch {
                    frame_width: live.width,
                    frame_height: live.height,
                    background_width: background.width,
                    background_height: background.height,
                });
            }
            Ok(live.clone())
        }
    }

    struct MockStore {
        background: Option<Frame>,
    }

    impl BackgroundStorePort for MockStore {
        fn save(&mut self, _path: &std::path::Path, _frame: &Frame) -> DomainResult<()> {
            Ok(())
        }

        fn load(&mut self, path: &std::path::Path) -> DomainResult<Frame> {
            self.background
                .clone()
                .ok_or_else(|| DomainError::BackgroundMissing {
                    path: path.display().to_string(),
                })
        }

        fn load_resized(
            &mut self,
            path: &std::path::Path,
            width: u32,
            height: u32,
        ) -> DomainResult<Frame> {
            let frame = self.load(path)?;
            Ok(Frame::solid(width, height, frame.pixel(0, 0)))
        }
    }

    struct MockDisplay {
        shows: Arc<Mutex<u32>>,
        mask_shows: Arc<Mutex<u32>>,
        keys: VecDeque<Option<i32>>,
    }

    impl DisplayPort for MockDisplay {
        fn show(&mut self, _window: &str, _frame: &Frame) -> DomainResult<()> {
            *self.shows.lock().unwrap() += 1;
            Ok(())
        }

        fn show_mask(&mut self, _window: &str, _mask: &Mask) -> DomainResult<()> {
            *self.mask_shows.lock().unwrap() += 1;
            Ok(())
        }

        fn poll_key(&mut self, _wait: Duration) -> DomainResult<Option<i32>> {
            Ok(self.keys.pop_front().unwrap_or(None))
        }
    }

    fn test_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.stream_warmup = Duration::ZERO;
        config.poll_interval = Duration::from_millis(1);
        config
    }

    fn test_pipeline(
        frames: usize,
        background: Option<Frame>,
        keys: Vec<Option<i32>>,
        config: PipelineConfig,
    ) -> (
        CloakPipeline<MockCapture, MockProcessor, MockStore, MockDisplay>,
        Arc<Mutex<u32>>,
        Arc<Mutex<u32>>,
    ) {
        let shows = Arc::new(Mutex::new(0));
        let mask_shows = Arc::new(Mutex::new(0));
        let pipeline = CloakPipeline::new(
            MockCapture {
                frames_before_failure: frames,
            },
            MockProcessor,
            MockStore { background },
            MockDisplay {
                shows: Arc::clone(&shows),
                mask_shows: Arc::clone(&mask_shows),
                keys: keys.into(),
            },
            config,
        );
        (pipeline, shows, mask_shows)
    }

    #[test]
    fn test_quit_key_stops_streaming() {
        // 2回目のポーリングで'q'が押される
        let keys = vec![None, Some('q' as i32)];
        let (pipeline, shows, _) =
            test_pipeline(1000, Some(Frame::solid(2, 2, [0, 255, 0])), keys, test_config());

        pipeline.run().expect("正常終了するはず");
        assert_eq!(*shows.lock().unwrap(), 2);
    }

    #[test]
    fn test_esc_also_stops_streaming() {
        let keys = vec![Some(KEY_ESC)];
        let (pipeline, shows, _) =
            test_pipeline(1000, Some(Frame::solid(2, 2, [0, 255, 0])), keys, test_config());

        pipeline.run().expect("正常終了するはず");
        assert_eq!(*shows.lock().unwrap(), 1);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let keys = vec![Some('a' as i32), Some('q' as i32)];
        let (pipeline, shows, _) =
            test_pipeline(1000, Some(Frame::solid(2, 2, [0, 255, 0])), keys, test_config());

        pipeline.run().expect("正常終了するはず");
        assert_eq!(*shows.lock().unwrap(), 2);
    }

    #[test]
    fn test_read_failure_stops_gracefully() {
        // Initのプローブで1フレーム消費、ストリームで2フレーム後に失敗
        let (pipeline, shows, _) =
            test_pipeline(3, Some(Frame::solid(2, 2, [0, 255, 0])), vec![], test_config());

        // 読み取り失敗はエラーではなく正常停止
        pipeline.run().expect("正常終了するはず");
        assert_eq!(*shows.lock().unwrap(), 2);
    }

    #[test]
    fn test_missing_background_fails_init() {
        let (pipeline, shows, _) = test_pipeline(1000, None, vec![], test_config());

        let result = pipeline.run();
        assert!(matches!(
            result,
            Err(DomainError::BackgroundMissing { .. })
        ));
        // ストリームには到達しない
        assert_eq!(*shows.lock().unwrap(), 0);
    }

    #[test]
    fn test_init_capture_failure_is_terminal() {
        let (pipeline, shows, _) =
            test_pipeline(0, Some(Frame::solid(2, 2, [0, 255, 0])), vec![], test_config());

        let result = pipeline.run();
        assert!(matches!(result, Err(DomainError::CaptureFailed)));
        assert_eq!(*shows.lock().unwrap(), 0);
    }

    #[test]
    fn test_show_mask_renders_second_window() {
        let mut config = test_config();
        config.show_mask = true;
        let keys = vec![Some('q' as i32)];
        let (pipeline, shows, mask_shows) =
            test_pipeline(1000, Some(Frame::solid(2, 2, [0, 255, 0])), keys, config);

        pipeline.run().expect("正常終了するはず");
        assert_eq!(*shows.lock().unwrap(), 1);
        assert_eq!(*mask_shows.lock().unwrap(), 1);
    }
}
