//! Protected preview player
//!
//! One `PreviewPlayer` per listing. `play` fetches and decodes the preview
//! and the watermark concurrently, mixes them and starts output; `stop`
//! cancels whatever is in flight. Every transition is published as a
//! `PlayerEvent`.
//!
//! Idle -> Loading -> Playing -> Idle, or Loading -> Idle on failure/stop.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::config::PlayerConfig;
use crate::error::DecodeError;
use super::buffer::PcmBuffer;
use super::decoder::decode_audio;
use super::fetch::AssetFetcher;
use super::mix::WatermarkMix;
use super::output::{AudioSink, PlaybackCursor};
use super::resample::resample;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Loading,
    Playing,
}

#[derive(Clone, Debug)]
pub enum PlayerEvent {
    Loading {
        listing_id: String,
    },
    Playing {
        listing_id: String,
        cursor: Arc<PlaybackCursor>,
    },
    Stopped {
        listing_id: String,
    },
    EndOfPreview {
        listing_id: String,
    },
    DecodeFailed {
        listing_id: String,
        error: String,
    },
}

impl PlayerEvent {
    pub fn listing_id(&self) -> &str {
        match self {
            PlayerEvent::Loading { listing_id }
            | PlayerEvent::Playing { listing_id, .. }
            | PlayerEvent::Stopped { listing_id }
            | PlayerEvent::EndOfPreview { listing_id }
            | PlayerEvent::DecodeFailed { listing_id, .. } => listing_id,
        }
    }

    /// Player state after this event
    pub fn state(&self) -> PlayerState {
        match self {
            PlayerEvent::Loading { .. } => PlayerState::Loading,
            PlayerEvent::Playing { .. } => PlayerState::Playing,
            _ => PlayerState::Idle,
        }
    }
}

/// Everything a player needs besides its own preview URL. Cloned into every
/// player so rows never share mutable state.
#[derive(Clone)]
pub struct PlayerContext {
    pub fetcher: Arc<dyn AssetFetcher>,
    pub sink: Arc<dyn AudioSink>,
    pub watermark_url: String,
    pub gain: f32,
    pub repeat_secs: Option<f32>,
    pub timeout: Duration,
    pub events: UnboundedSender<PlayerEvent>,
}

impl PlayerContext {
    pub fn new(
        config: &PlayerConfig,
        fetcher: Arc<dyn AssetFetcher>,
        sink: Arc<dyn AudioSink>,
        events: UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            watermark_url: config.watermark_url.clone(),
            gain: config.watermark_gain,
            repeat_secs: config.watermark_repeat_secs,
            timeout: config.fetch_timeout(),
            events,
        }
    }
}

#[derive(Default)]
struct Session {
    state: PlayerState,
    cancel: Option<CancellationToken>,
    cursor: Option<Arc<PlaybackCursor>>,
}

pub struct PreviewPlayer {
    listing_id: String,
    preview_url: String,
    ctx: PlayerContext,
    session: Arc<Mutex<Session>>,
}

impl PreviewPlayer {
    pub fn new(listing_id: impl Into<String>, preview_url: impl Into<String>, ctx: PlayerContext) -> Self {
        Self {
            listing_id: listing_id.into(),
            preview_url: preview_url.into(),
            ctx,
            session: Arc::new(Mutex::new(Session::default())),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.session.lock().state
    }

    /// Start loading the preview. Ignored unless idle; returns whether a
    /// load was started.
    pub fn play(&self) -> bool {
        let token = {
            let mut session = self.session.lock();
            if session.state != PlayerState::Idle {
                return false;
            }
            let token = CancellationToken::new();
            session.state = PlayerState::Loading;
            session.cancel = Some(token.clone());
            self.emit(PlayerEvent::Loading {
                listing_id: self.listing_id.clone(),
            });
            token
        };

        tracing::debug!(listing_id = %self.listing_id, url = %self.preview_url, "Preview loading");

        let task = PlayTask {
            listing_id: self.listing_id.clone(),
            preview_url: self.preview_url.clone(),
            ctx: self.ctx.clone(),
            session: self.session.clone(),
            token,
        };
        tokio::spawn(task.run());
        true
    }

    /// Cancel loading or silence playback. No-op when idle.
    pub fn stop(&self) {
        let stopped = teardown(&self.session, || {
            self.emit(PlayerEvent::Stopped {
                listing_id: self.listing_id.clone(),
            })
        });
        if stopped {
            tracing::debug!(listing_id = %self.listing_id, "Preview stopped");
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.ctx.events.send(event);
    }
}

impl Drop for PreviewPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cancel in-flight work and release output, announcing it while the
/// session is still locked. Returns false if already idle.
fn teardown(session: &Mutex<Session>, announce: impl FnOnce()) -> bool {
    let mut session = session.lock();
    if session.state == PlayerState::Idle {
        return false;
    }
    if let Some(token) = session.cancel.take() {
        token.cancel();
    }
    if let Some(cursor) = session.cursor.take() {
        cursor.stop();
    }
    session.state = PlayerState::Idle;
    announce();
    true
}

struct PlayTask {
    listing_id: String,
    preview_url: String,
    ctx: PlayerContext,
    session: Arc<Mutex<Session>>,
    token: CancellationToken,
}

impl PlayTask {
    async fn run(self) {
        let loaded = tokio::select! {
            _ = self.token.cancelled() => return,
            result = tokio::time::timeout(self.ctx.timeout, self.load()) => {
                result.unwrap_or(Err(DecodeError::Timeout))
            }
        };

        let mixed = match loaded {
            Ok(mixed) => mixed,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };

        let sink = self.ctx.sink.clone();
        let started = tokio::task::spawn_blocking(move || sink.start(mixed)).await;
        let cursor = match started {
            Ok(Ok(cursor)) => cursor,
            Ok(Err(e)) => {
                self.fail(e.to_string());
                return;
            }
            Err(e) => {
                self.fail(format!("output task failed: {}", e));
                return;
            }
        };

        {
            let mut session = self.session.lock();
            if self.token.is_cancelled() {
                cursor.stop();
                return;
            }
            session.state = PlayerState::Playing;
            session.cursor = Some(cursor.clone());
            let _ = self.ctx.events.send(PlayerEvent::Playing {
                listing_id: self.listing_id.clone(),
                cursor: cursor.clone(),
            });
            tracing::info!(
                listing_id = %self.listing_id,
                duration_ms = cursor.duration_ms(),
                "Preview playing"
            );
        }

        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = cursor.ended() => {
                if self.finish_if_current() {
                    tracing::debug!(listing_id = %self.listing_id, "Preview ended");
                }
            }
        }
    }

    /// Fetch and decode both assets concurrently; the first failure wins
    /// and drops the other branch.
    async fn load(&self) -> Result<PcmBuffer, DecodeError> {
        let (preview, watermark) = tokio::try_join!(
            fetch_and_decode(self.ctx.fetcher.as_ref(), &self.preview_url),
            fetch_and_decode(self.ctx.fetcher.as_ref(), &self.ctx.watermark_url),
        )?;

        let mix = WatermarkMix::new(self.ctx.gain)
            .repeating_every(self.ctx.repeat_secs, preview.sample_rate);
        let mixed = tokio::task::spawn_blocking(move || {
            let watermark = resample(watermark, preview.sample_rate);
            mix.apply(&preview, &watermark)
        })
        .await
        .map_err(|e| DecodeError::Codec {
            url: self.preview_url.clone(),
            reason: format!("mix task failed: {}", e),
        })?;
        Ok(mixed)
    }

    fn fail(&self, error: String) {
        let mut session = self.session.lock();
        if self.token.is_cancelled() {
            return;
        }
        session.state = PlayerState::Idle;
        session.cancel = None;
        tracing::error!(listing_id = %self.listing_id, error = %error, "Preview failed");
        let _ = self.ctx.events.send(PlayerEvent::DecodeFailed {
            listing_id: self.listing_id.clone(),
            error,
        });
    }

    /// Return to idle after a natural end, unless a stop got there first
    fn finish_if_current(&self) -> bool {
        let mut session = self.session.lock();
        if self.token.is_cancelled() {
            return false;
        }
        session.state = PlayerState::Idle;
        session.cancel = None;
        session.cursor = None;
        let _ = self.ctx.events.send(PlayerEvent::EndOfPreview {
            listing_id: self.listing_id.clone(),
        });
        true
    }
}

async fn fetch_and_decode(fetcher: &dyn AssetFetcher, url: &str) -> Result<PcmBuffer, DecodeError> {
    let bytes = fetcher.fetch(url).await?;
    let url_owned = url.to_string();
    tokio::task::spawn_blocking(move || decode_audio(bytes, &url_owned))
        .await
        .map_err(|e| DecodeError::Codec {
            url: url.to_string(),
            reason: format!("decode task failed: {}", e),
        })?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use crate::audio::decoder::tests::wav_bytes;
    use crate::error::OutputError;

    pub(crate) const PREVIEW: &str = "https://cdn.test/preview.wav";
    const WATERMARK: &str = "/watermark.wav";

    pub(crate) struct FakeFetcher {
        assets: HashMap<String, Vec<u8>>,
        delay: Duration,
    }

    impl FakeFetcher {
        pub(crate) fn new(assets: &[(&str, Vec<u8>)]) -> Self {
            Self {
                assets: assets.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                delay: Duration::ZERO,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, DecodeError>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.assets.get(url).cloned().ok_or_else(|| DecodeError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            })
        }
    }

    /// Records every cursor it hands out; the test drives playback by
    /// calling `fill` on them.
    #[derive(Default)]
    pub(crate) struct FakeSink {
        pub(crate) cursors: Mutex<Vec<Arc<PlaybackCursor>>>,
        pub(crate) starts: AtomicUsize,
    }

    impl AudioSink for FakeSink {
        fn start(&self, audio: PcmBuffer) -> Result<Arc<PlaybackCursor>, OutputError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            let cursor = Arc::new(PlaybackCursor::from_buffer(&audio, audio.channel_count()));
            self.cursors.lock().push(cursor.clone());
            Ok(cursor)
        }
    }

    pub(crate) fn context(
        fetcher: FakeFetcher,
        sink: Arc<FakeSink>,
    ) -> (PlayerContext, UnboundedReceiver<PlayerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = PlayerContext {
            fetcher: Arc::new(fetcher),
            sink,
            watermark_url: WATERMARK.to_string(),
            gain: 0.2,
            repeat_secs: None,
            timeout: Duration::from_secs(5),
            events: tx,
        };
        (ctx, rx)
    }

    pub(crate) fn valid_assets() -> FakeFetcher {
        FakeFetcher::new(&[
            (PREVIEW, wav_bytes(8_000, 1, 800, 0.5)),
            (WATERMARK, wav_bytes(8_000, 1, 400, 0.5)),
        ])
    }

    async fn next_event(rx: &mut UnboundedReceiver<PlayerEvent>) -> PlayerEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for player event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn plays_mixed_preview_then_stops() {
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(valid_assets(), sink.clone());
        let player = PreviewPlayer::new("beat-1", PREVIEW, ctx);

        assert!(player.play());
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Loading { .. }));
        let cursor = match next_event(&mut rx).await {
            PlayerEvent::Playing { listing_id, cursor } => {
                assert_eq!(listing_id, "beat-1");
                cursor
            }
            other => panic!("expected Playing, got {other:?}"),
        };
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 1);
        assert_eq!(cursor.duration_ms(), 100);

        // a second play while playing is ignored
        assert!(!player.play());

        let mut out = [0.0f32; 4];
        cursor.fill(&mut out, |s| s);
        assert!(out.iter().all(|s| (s - 0.6).abs() < 0.01), "{out:?}");

        player.stop();
        assert_eq!(player.state(), PlayerState::Idle);
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Stopped { .. }));

        cursor.fill(&mut out, |s| s);
        assert_eq!(out, [0.0; 4]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn undecodable_preview_never_plays() {
        let fetcher = FakeFetcher::new(&[
            (PREVIEW, b"<html>not audio</html>".to_vec()),
            (WATERMARK, wav_bytes(8_000, 1, 400, 0.5)),
        ]);
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(fetcher, sink.clone());
        let player = PreviewPlayer::new("beat-2", PREVIEW, ctx);

        player.play();
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Loading { .. }));
        match next_event(&mut rx).await {
            PlayerEvent::DecodeFailed { listing_id, error } => {
                assert_eq!(listing_id, "beat-2");
                assert!(error.contains(PREVIEW), "{error}");
            }
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_watermark_fails_the_join() {
        let fetcher = FakeFetcher::new(&[(PREVIEW, wav_bytes(8_000, 1, 400, 0.5))]);
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(fetcher, sink.clone());
        let player = PreviewPlayer::new("beat-3", PREVIEW, ctx);

        player.play();
        next_event(&mut rx).await;
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::DecodeFailed { .. }));
        assert_eq!(player.state(), PlayerState::Idle);

        // a failed attempt can be retried by the user
        assert!(player.play());
    }

    #[tokio::test]
    async fn stop_during_loading_cancels() {
        let fetcher = valid_assets().slow(Duration::from_millis(200));
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(fetcher, sink.clone());
        let player = PreviewPlayer::new("beat-4", PREVIEW, ctx);

        player.play();
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Loading { .. }));
        player.stop();
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Stopped { .. }));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_assets_time_out() {
        let fetcher = valid_assets().slow(Duration::from_millis(500));
        let sink = Arc::new(FakeSink::default());
        let (mut ctx, mut rx) = context(fetcher, sink.clone());
        ctx.timeout = Duration::from_millis(50);
        let player = PreviewPlayer::new("beat-5", PREVIEW, ctx);

        player.play();
        next_event(&mut rx).await;
        match next_event(&mut rx).await {
            PlayerEvent::DecodeFailed { error, .. } => {
                assert_eq!(error, DecodeError::Timeout.to_string());
            }
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[tokio::test]
    async fn natural_end_returns_to_idle() {
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(valid_assets(), sink.clone());
        let player = PreviewPlayer::new("beat-6", PREVIEW, ctx);

        player.play();
        next_event(&mut rx).await;
        let cursor = match next_event(&mut rx).await {
            PlayerEvent::Playing { cursor, .. } => cursor,
            other => panic!("expected Playing, got {other:?}"),
        };

        let mut out = vec![0.0f32; 1_000];
        cursor.fill(&mut out, |s| s);
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::EndOfPreview { .. }));
        assert_eq!(player.state(), PlayerState::Idle);
    }

    /// Blocks the calling thread whenever an event with the given message
    /// is recorded, widening any window right around that log call.
    struct PauseOnMessage {
        message: &'static str,
        pause: Duration,
    }

    struct MessageField(Option<String>);

    impl tracing::field::Visit for MessageField {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for PauseOnMessage {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut field = MessageField(None);
            event.record(&mut field);
            if field.0.as_deref() == Some(self.message) {
                std::thread::sleep(self.pause);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_right_after_playing_commits_ends_idle() {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::registry()
            .with(PauseOnMessage {
                message: "Preview playing",
                pause: Duration::from_millis(300),
            })
            .try_init();

        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(valid_assets(), sink.clone());
        let player = PreviewPlayer::new("beat-8", PREVIEW, ctx);

        player.play();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while player.state() != PlayerState::Playing {
            assert!(std::time::Instant::now() < deadline, "preview never started");
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        player.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(sink.starts.load(Ordering::SeqCst), 1);
        let states: Vec<PlayerState> = events.iter().map(PlayerEvent::state).collect();
        assert_eq!(
            states,
            vec![PlayerState::Loading, PlayerState::Playing, PlayerState::Idle],
            "{events:?}"
        );
    }

    #[tokio::test]
    async fn resampled_watermark_keeps_its_full_length() {
        // 8 kHz preview of 100 ms under a 16 kHz stereo watermark of 200 ms
        let fetcher = FakeFetcher::new(&[
            (PREVIEW, wav_bytes(8_000, 1, 800, 0.5)),
            (WATERMARK, wav_bytes(16_000, 2, 3_200, 0.5)),
        ]);
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(fetcher, sink.clone());
        let player = PreviewPlayer::new("beat-9", PREVIEW, ctx);

        player.play();
        next_event(&mut rx).await;
        let cursor = match next_event(&mut rx).await {
            PlayerEvent::Playing { cursor, .. } => cursor,
            other => panic!("expected Playing, got {other:?}"),
        };
        assert_eq!(cursor.duration_ms(), 200);

        // mono preview: one interleaved sample per frame
        let mut out = vec![0.0f32; 1_600];
        cursor.fill(&mut out, |s| s);
        assert!(cursor.is_finished());
        player.stop();
    }

    #[tokio::test]
    async fn dropping_the_player_silences_output() {
        let sink = Arc::new(FakeSink::default());
        let (ctx, mut rx) = context(valid_assets(), sink.clone());
        let player = PreviewPlayer::new("beat-7", PREVIEW, ctx);

        player.play();
        next_event(&mut rx).await;
        let cursor = match next_event(&mut rx).await {
            PlayerEvent::Playing { cursor, .. } => cursor,
            other => panic!("expected Playing, got {other:?}"),
        };

        drop(player);
        assert!(cursor.is_stopped());
        assert!(matches!(next_event(&mut rx).await, PlayerEvent::Stopped { .. }));
    }
}
