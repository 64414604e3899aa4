//! # Frame Loop Decoder
//!
//! A [`Decoder`] that polls a [`FrameSource`] at a bounded rate.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start()                                                               │
//! │    source.acquire(facing)        ← camera permission prompt            │
//! │    spawn ─────────────────────────────────────────────┐                │
//! │                                                       ▼                │
//! │            every 1000/fps ms (missed ticks skipped):                   │
//! │              analyze(region, symbologies)                              │
//! │                 ├── None            → sink.tick()                      │
//! │                 ├── same text < 1.5s → sink.tick()   (debounced)       │
//! │                 └── Some(text)      → sink.decoded(text), then hold    │
//! │                                       (no more frames read until stop) │
//! │                                                                         │
//! │  stop()  → cancel token → loop exits → source.release() → source and  │
//! │            debouncer handed back so the next start() reuses them      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`WedgeSource`] adapts USB keyboard-wedge scanners, which type the code
//! followed by Enter, to the same loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::decoder::{DecodeSink, Decoder, DecoderFactory};
use crate::error::{CaptureError, CaptureResult};
use crate::settings::{CameraFacing, CaptureRegion, CaptureSettings};
use crate::symbology::Symbology;

// =============================================================================
// Frame Source
// =============================================================================

/// Something that yields frames to analyze: a camera, or a wedge.
#[async_trait]
pub trait FrameSource: Send + Sync + 'static {
    /// Opens the device. Fails with `PermissionDenied`, `NoCamera`, `DeviceBusy`.
    async fn acquire(&mut self, facing: CameraFacing) -> CaptureResult<()>;

    /// Analyzes the next frame inside `region`. `None` means nothing found.
    fn analyze(&mut self, region: CaptureRegion, symbologies: &[Symbology]) -> Option<String>;

    async fn release(&mut self);
}

// =============================================================================
// Debouncer
// =============================================================================

/// Suppresses identical consecutive decodes within a window.
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Debouncer { window, last: None }
    }

    fn accept(&mut self, text: &str, now: Instant) -> bool {
        if let Some((last, at)) = &self.last {
            if last == text && now.duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((text.to_string(), now));
        true
    }
}

// =============================================================================
// Frame Loop Decoder
// =============================================================================

/// What the loop task owns while running and returns when it exits.
struct Parked<S> {
    source: S,
    debouncer: Debouncer,
}

struct Running<S> {
    cancel: CancellationToken,
    task: JoinHandle<Parked<S>>,
}

/// Bounded-rate decoder over a [`FrameSource`].
///
/// Each `start()` reports at most one decode. The controller stops the loop
/// after a decode, so frames read past it would only be lost.
pub struct FrameLoopDecoder<S: FrameSource> {
    symbologies: Vec<Symbology>,
    parked: Option<Parked<S>>,
    running: Option<Running<S>>,
}

impl<S: FrameSource> FrameLoopDecoder<S> {
    pub fn new(source: S, symbologies: &[Symbology]) -> Self {
        FrameLoopDecoder {
            symbologies: symbologies.to_vec(),
            parked: Some(Parked {
                source,
                debouncer: Debouncer::new(Duration::ZERO),
            }),
            running: None,
        }
    }
}

#[async_trait]
impl<S: FrameSource> Decoder for FrameLoopDecoder<S> {
    async fn start(&mut self, settings: &CaptureSettings, sink: DecodeSink) -> CaptureResult<()> {
        if self.is_active() {
            return Err(CaptureError::DeviceBusy);
        }
        // A previous loop that ended on its own still owns the source.
        if let Some(finished) = self.running.take() {
            if let Ok(parked) = finished.task.await {
                self.parked = Some(parked);
            }
        }

        let Parked {
            mut source,
            mut debouncer,
        } = self.parked.take().ok_or(CaptureError::DeviceBusy)?;

        if let Err(e) = source.acquire(settings.facing).await {
            source.release().await;
            self.parked = Some(Parked { source, debouncer });
            return Err(e);
        }

        // Kept across restarts so a code still in view after a rearm is
        // not reported twice.
        debouncer.window = settings.debounce_window();

        let cancel = CancellationToken::new();
        let period = settings.frame_interval();
        let region = settings.region;
        let symbologies = self.symbologies.clone();
        let loop_cancel = cancel.clone();

        info!(
            fps = settings.fps,
            width = region.width,
            height = region.height,
            generation = sink.generation(),
            "Frame loop starting"
        );

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = loop_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        match source.analyze(region, &symbologies) {
                            Some(text) if debouncer.accept(&text, Instant::now()) => {
                                debug!(%text, "Frame decoded");
                                sink.decoded(text);
                                // Hold until stopped.
                                loop_cancel.cancelled().await;
                                break;
                            }
                            _ => sink.tick(),
                        }
                    }
                }
            }

            source.release().await;
            debug!("Frame loop stopped");
            Parked { source, debouncer }
        });

        self.running = Some(Running { cancel, task });
        Ok(())
    }

    async fn stop(&mut self) -> CaptureResult<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.cancel.cancel();
        match running.task.await {
            Ok(parked) => {
                self.parked = Some(parked);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Frame loop task failed");
                Err(CaptureError::InitFailed("frame loop terminated".to_string()))
            }
        }
    }

    fn is_active(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }
}

impl<S: FrameSource> Drop for FrameLoopDecoder<S> {
    fn drop(&mut self) {
        // The task releases the source on its way out.
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

// =============================================================================
// Keyboard Wedge
// =============================================================================

/// Lines typed by a keyboard-wedge scanner, shared by every decoder the
/// factory creates.
pub type WedgeLines = Arc<Mutex<mpsc::Receiver<String>>>;

/// [`FrameSource`] fed by text lines. Each line is one "frame".
///
/// The first acquire discards lines typed before any session was
/// listening. Later acquires on the same source, such as a restart after a
/// scan, keep queued lines so back-to-back scans are all delivered.
pub struct WedgeSource {
    lines: WedgeLines,
    primed: bool,
}

impl WedgeSource {
    pub fn new(lines: WedgeLines) -> Self {
        WedgeSource {
            lines,
            primed: false,
        }
    }
}

#[async_trait]
impl FrameSource for WedgeSource {
    async fn acquire(&mut self, _facing: CameraFacing) -> CaptureResult<()> {
        let mut lines = self.lines.try_lock().map_err(|_| CaptureError::DeviceBusy)?;
        if !self.primed {
            let mut stale = 0usize;
            while lines.try_recv().is_ok() {
                stale += 1;
            }
            if stale > 0 {
                debug!(stale, "Discarded wedge input typed before the session opened");
            }
            self.primed = true;
        }
        Ok(())
    }

    fn analyze(&mut self, _region: CaptureRegion, symbologies: &[Symbology]) -> Option<String> {
        let mut lines = self.lines.try_lock().ok()?;
        let line = lines.try_recv().ok()?;
        let text = line.trim();

        if text.is_empty() {
            return None;
        }
        if !symbologies.iter().any(|s| s.accepts(text)) {
            debug!(%text, "Wedge input matches no enabled symbology");
            return None;
        }
        Some(text.to_string())
    }

    async fn release(&mut self) {}
}

/// Creates a [`FrameLoopDecoder`] over a [`WedgeSource`] per session.
#[derive(Clone)]
pub struct WedgeDecoderFactory {
    lines: WedgeLines,
}

impl WedgeDecoderFactory {
    pub fn new(lines: WedgeLines) -> Self {
        WedgeDecoderFactory { lines }
    }
}

impl DecoderFactory for WedgeDecoderFactory {
    fn create(&self, symbologies: &[Symbology]) -> CaptureResult<Box<dyn Decoder>> {
        if symbologies.is_empty() {
            return Err(CaptureError::InitFailed("no symbologies enabled".to_string()));
        }
        Ok(Box::new(FrameLoopDecoder::new(
            WedgeSource::new(self.lines.clone()),
            symbologies,
        )))
    }
}

/// Sender for typed lines plus the matching decoder factory.
pub fn wedge_channel(capacity: usize) -> (mpsc::Sender<String>, WedgeDecoderFactory) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, WedgeDecoderFactory::new(Arc::new(Mutex::new(rx))))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Event;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    struct ScriptedSource {
        frames: VecDeque<Option<&'static str>>,
        acquire_error: Option<CaptureError>,
        counters: Arc<Counters>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Option<&'static str>>) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let source = ScriptedSource {
                frames: frames.into(),
                acquire_error: None,
                counters: counters.clone(),
            };
            (source, counters)
        }
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        async fn acquire(&mut self, _facing: CameraFacing) -> CaptureResult<()> {
            if let Some(e) = self.acquire_error.take() {
                return Err(e);
            }
            self.counters.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn analyze(&mut self, _region: CaptureRegion, _s: &[Symbology]) -> Option<String> {
            self.frames.pop_front().flatten().map(str::to_string)
        }

        async fn release(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sink() -> (DecodeSink, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(256);
        (DecodeSink::new(1, tx), rx)
    }

    fn decoded(rx: &mut mpsc::Receiver<Event>) -> (Vec<String>, usize) {
        let mut texts = Vec::new();
        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                Event::Decoded { text, .. } => texts.push(text),
                Event::Tick { .. } => ticks += 1,
                _ => {}
            }
        }
        (texts, ticks)
    }

    #[test]
    fn test_debouncer_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(1500));

        assert!(d.accept("A", start));
        assert!(!d.accept("A", start + Duration::from_millis(100)));
        assert!(d.accept("B", start + Duration::from_millis(200)));
        assert!(d.accept("A", start + Duration::from_millis(300)));
        assert!(d.accept("A", start + Duration::from_millis(1900)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_decode_per_start_debounced_across_restarts() {
        let (source, counters) =
            ScriptedSource::new(vec![Some("A"), Some("B"), Some("B"), None]);
        let mut decoder = FrameLoopDecoder::new(source, &Symbology::ALL);
        let settings = CaptureSettings::default();

        let (first, mut rx) = sink();
        decoder.start(&settings, first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Holding after the decode; "B" is left unread.
        assert!(decoder.is_active());
        decoder.stop().await.unwrap();
        let (texts, _) = decoded(&mut rx);
        assert_eq!(texts, vec!["A"]);

        let (second, mut rx) = sink();
        decoder.start(&settings, second).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        decoder.stop().await.unwrap();

        let (texts, _) = decoded(&mut rx);
        assert_eq!(texts, vec!["B"]);

        let (third, mut rx) = sink();
        decoder.start(&settings, third).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        decoder.stop().await.unwrap();

        let (texts, ticks) = decoded(&mut rx);
        assert!(texts.is_empty(), "repeat of B inside the window: {texts:?}");
        assert!(ticks >= 2);

        assert!(!decoder.is_active());
        assert_eq!(counters.acquired.load(Ordering::SeqCst), 3);
        assert_eq!(counters.released.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop_reuses_source() {
        let (source, counters) = ScriptedSource::new(vec![]);
        let mut decoder = FrameLoopDecoder::new(source, &Symbology::ALL);
        let settings = CaptureSettings::default();

        decoder.start(&settings, sink().0).await.unwrap();
        assert_eq!(decoder.start(&settings, sink().0).await, Err(CaptureError::DeviceBusy));
        decoder.stop().await.unwrap();

        decoder.start(&settings, sink().0).await.unwrap();
        decoder.stop().await.unwrap();

        // Stop when already stopped is fine
        decoder.stop().await.unwrap();
        assert_eq!(counters.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(counters.released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_acquire_leaves_decoder_inactive() {
        let (mut source, counters) = ScriptedSource::new(vec![]);
        source.acquire_error = Some(CaptureError::NoCamera);
        let mut decoder = FrameLoopDecoder::new(source, &Symbology::ALL);
        let settings = CaptureSettings::default();

        let err = decoder.start(&settings, sink().0).await.unwrap_err();
        assert_eq!(err, CaptureError::NoCamera);
        assert!(!decoder.is_active());
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);

        // Source kept; the next attempt can succeed
        decoder.start(&settings, sink().0).await.unwrap();
        assert!(decoder.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wedge_lines_become_decodes() {
        let (lines, factory) = wedge_channel(8);
        let mut decoder = factory.create(&[Symbology::Ean13]).unwrap();
        let (sink, mut rx) = sink();

        decoder.start(&CaptureSettings::default(), sink).await.unwrap();

        lines.send("0123456789128\r".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        lines.send("not-a-barcode".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        decoder.stop().await.unwrap();
        let (texts, _) = decoded(&mut rx);
        assert_eq!(texts, vec!["0123456789128"]);
    }

    #[test]
    fn test_wedge_factory_requires_symbologies() {
        let (_lines, factory) = wedge_channel(1);
        assert!(matches!(
            factory.create(&[]),
            Err(CaptureError::InitFailed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wedge_keeps_queued_lines_across_restart() {
        let (lines, factory) = wedge_channel(8);
        let mut decoder = factory.create(&[Symbology::Ean13]).unwrap();
        let settings = CaptureSettings::default();

        // Typed before any session: discarded by the first acquire.
        lines.send("4006381333931".into()).await.unwrap();

        let (first, mut rx) = sink();
        decoder.start(&settings, first).await.unwrap();
        lines.send("0123456789128".into()).await.unwrap();
        lines.send("7501055300075".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        decoder.stop().await.unwrap();
        assert_eq!(decoded(&mut rx).0, vec!["0123456789128"]);

        let (second, mut rx) = sink();
        decoder.start(&settings, second).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        decoder.stop().await.unwrap();
        assert_eq!(decoded(&mut rx).0, vec!["7501055300075"]);
    }
}
