//! # Capture Controller
//!
//! Actor that owns one decoder and runs the capture state machine.
//!
//! ## Actor Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CaptureController (one tokio task)                   │
//! │                                                                         │
//! │  CaptureHandle ──Request{op, epoch}──►┐                                 │
//! │                                        │      ┌─────────────────────┐   │
//! │  DecodeSink  ──Event::Decoded/Tick───► ├────► │ transition(Event)   │   │
//! │                                        │      │ (single entry point)│   │
//! │  timers      ──AutoClose/RetrySettled─►┘      └──────────┬──────────┘   │
//! │                                                          │              │
//! │                       Arc<RwLock<CaptureState>> ◄────────┤              │
//! │                       CaptureObserver         ◄──────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Teardown Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handle.close()                                                        │
//! │    1. SessionGate::close()  epoch += 1, cancel in-flight start/stop    │
//! │    2. enqueue Close{epoch}                                             │
//! │                                                                         │
//! │  Actor, until Close{epoch} is applied:                                 │
//! │    • commands stamped with an older epoch      → dropped               │
//! │    • decoder events                            → dropped               │
//! │  After Close: every sink from the old session carries a stale          │
//! │  generation, so late decodes never reach the observer.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::decoder::{DecodeSink, Decoder, DecoderFactory};
use crate::error::{CaptureError, CaptureResult};
use crate::settings::CaptureSettings;

const REQUEST_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

// =============================================================================
// State
// =============================================================================

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No decoder instance.
    #[default]
    Idle,
    /// Decoder constructed; camera not yet streaming.
    Initializing,
    /// Frames are being analyzed.
    Scanning,
    /// Scanning halted by `stop()`; the decoder is kept for a restart.
    Stopped,
    /// A barcode was decoded. Auto-closes to `Idle`.
    Success(String),
    Error(CaptureError),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Initializing => "initializing",
            CaptureState::Scanning => "scanning",
            CaptureState::Stopped => "stopped",
            CaptureState::Success(_) => "success",
            CaptureState::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Success(text) => write!(f, "success({text})"),
            CaptureState::Error(e) => write!(f, "error({e})"),
            other => f.write_str(other.name()),
        }
    }
}

// =============================================================================
// Observer
// =============================================================================

/// Receives state changes and accepted scans.
///
/// Called from the actor task; implementations should return quickly.
pub trait CaptureObserver: Send + Sync {
    /// Fires on every state change.
    fn on_state(&self, state: &CaptureState);

    /// Fires exactly once per accepted decode.
    fn on_scan(&self, text: &str);
}

/// Observer that ignores everything.
pub struct NoOpObserver;

impl CaptureObserver for NoOpObserver {
    fn on_state(&self, _state: &CaptureState) {}
    fn on_scan(&self, _text: &str) {}
}

// =============================================================================
// Messages
// =============================================================================

/// User-issued operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Open,
    Start,
    Stop,
    Retry,
    Close,
}

/// Everything the transition function consumes.
#[derive(Debug)]
pub(crate) enum Event {
    Command(Op),
    Decoded { generation: u64, text: String },
    Tick { generation: u64 },
    AutoCloseElapsed { generation: u64 },
    RetrySettled { generation: u64 },
}

enum Request {
    Apply {
        op: Op,
        epoch: u64,
        reply: oneshot::Sender<CaptureState>,
    },
    Shutdown,
}

// =============================================================================
// Session Gate
// =============================================================================

/// Close epoch plus the token that aborts in-flight decoder calls.
///
/// Shared by the handle and the actor. `close()` runs on the caller's side
/// before the Close request is even queued.
#[derive(Debug, Default)]
struct SessionGate {
    epoch: AtomicU64,
    token: Mutex<CancellationToken>,
}

impl SessionGate {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Begins teardown. Returns the new epoch.
    fn close(&self) -> u64 {
        let mut token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        token.cancel();
        *token = CancellationToken::new();
        epoch
    }

    /// Current epoch and the token a close at that epoch would cancel.
    fn snapshot(&self) -> (u64, CancellationToken) {
        let token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        (self.epoch(), token.clone())
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for driving a capture session from other components.
///
/// Each operation resolves once the actor has applied it and returns the
/// resulting state. Only `ControllerClosed` is returned as an error; capture
/// failures are reported as [`CaptureState::Error`].
#[derive(Clone)]
pub struct CaptureHandle {
    requests: mpsc::Sender<Request>,
    state: Arc<RwLock<CaptureState>>,
    gate: Arc<SessionGate>,
}

impl CaptureHandle {
    /// `Idle → Initializing`. No-op in any other state.
    pub async fn open(&self) -> CaptureResult<CaptureState> {
        self.apply(Op::Open).await
    }

    /// Starts scanning, opening first if needed. No-op while scanning.
    pub async fn start(&self) -> CaptureResult<CaptureState> {
        self.apply(Op::Start).await
    }

    /// `Scanning → Stopped`, keeping the decoder. No-op otherwise.
    pub async fn stop(&self) -> CaptureResult<CaptureState> {
        self.apply(Op::Stop).await
    }

    /// Clears an error and restarts after the settle delay.
    pub async fn retry(&self) -> CaptureResult<CaptureState> {
        self.apply(Op::Retry).await
    }

    /// Full teardown to `Idle`. Idempotent, safe during any in-flight call.
    pub async fn close(&self) -> CaptureResult<CaptureState> {
        self.apply(Op::Close).await
    }

    pub async fn state(&self) -> CaptureState {
        self.state.read().await.clone()
    }

    pub async fn is_scanning(&self) -> bool {
        *self.state.read().await == CaptureState::Scanning
    }

    /// Closes the session and ends the actor task.
    pub async fn shutdown(&self) -> CaptureResult<()> {
        self.gate.close();
        self.requests
            .send(Request::Shutdown)
            .await
            .map_err(|_| CaptureError::ControllerClosed)
    }

    async fn apply(&self, op: Op) -> CaptureResult<CaptureState> {
        let epoch = if op == Op::Close {
            self.gate.close()
        } else {
            self.gate.epoch()
        };

        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Apply { op, epoch, reply })
            .await
            .map_err(|_| CaptureError::ControllerClosed)?;

        rx.await.map_err(|_| CaptureError::ControllerClosed)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// The capture state machine, run as a background task.
///
/// ## Usage
/// ```rust,ignore
/// let handle = CaptureController::spawn(settings, factory, observer);
///
/// handle.start().await?;          // Idle → Initializing → Scanning
/// // ... observer.on_scan("0123456789128") fires, then auto-close → Idle
/// handle.close().await?;          // always safe
/// ```
pub struct CaptureController {
    settings: CaptureSettings,
    factory: Arc<dyn DecoderFactory>,
    observer: Arc<dyn CaptureObserver>,
    state: Arc<RwLock<CaptureState>>,
    gate: Arc<SessionGate>,

    /// Last close epoch the actor has applied.
    applied_epoch: u64,

    /// Session generation stamped on sinks and timers.
    generation: u64,

    decoder: Option<Box<dyn Decoder>>,
    timer: Option<JoinHandle<()>>,
    events_tx: mpsc::Sender<Event>,
}

impl CaptureController {
    /// Spawns the controller task and returns its handle.
    pub fn spawn(
        settings: CaptureSettings,
        factory: Arc<dyn DecoderFactory>,
        observer: Arc<dyn CaptureObserver>,
    ) -> CaptureHandle {
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_BUFFER);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let state = Arc::new(RwLock::new(CaptureState::Idle));
        let gate = Arc::new(SessionGate::default());

        let controller = CaptureController {
            settings,
            factory,
            observer,
            state: state.clone(),
            gate: gate.clone(),
            applied_epoch: 0,
            generation: 0,
            decoder: None,
            timer: None,
            events_tx,
        };

        tokio::spawn(controller.run(requests_rx, events_rx));

        CaptureHandle {
            requests: requests_tx,
            state,
            gate,
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut events: mpsc::Receiver<Event>,
    ) {
        info!("Capture controller started");

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Apply { op, epoch, reply }) => {
                        self.apply_request(op, epoch).await;
                        let _ = reply.send(self.current().await);
                    }
                    Some(Request::Shutdown) | None => break,
                },
                Some(event) = events.recv() => {
                    if self.gate.epoch() != self.applied_epoch {
                        trace!("Event dropped while teardown is pending");
                        continue;
                    }
                    self.transition(event).await;
                }
            }
        }

        self.do_close().await;
        info!("Capture controller stopped");
    }

    async fn apply_request(&mut self, op: Op, epoch: u64) {
        if op == Op::Close {
            self.applied_epoch = self.applied_epoch.max(epoch);
        } else if epoch != self.gate.epoch() {
            debug!(?op, "Command superseded by close; dropped");
            return;
        }
        self.transition(Event::Command(op)).await;
    }

    // =========================================================================
    // Transition Function
    // =========================================================================

    async fn transition(&mut self, event: Event) {
        match event {
            Event::Command(Op::Open) => self.do_open().await,
            Event::Command(Op::Start) => self.do_start().await,
            Event::Command(Op::Stop) => self.do_stop().await,
            Event::Command(Op::Retry) => self.do_retry().await,
            Event::Command(Op::Close) => self.do_close().await,

            Event::Decoded { generation, text } => {
                if generation != self.generation || !self.is(&CaptureState::Scanning).await {
                    debug!(generation, current = self.generation, "Stale decode dropped");
                    return;
                }
                self.on_decoded(text).await;
            }

            Event::Tick { generation } => {
                trace!(generation, "Frame without barcode");
            }

            Event::AutoCloseElapsed { generation } => {
                if generation == self.generation {
                    debug!("Auto-close after successful scan");
                    self.do_close().await;
                }
            }

            Event::RetrySettled { generation } => {
                if generation == self.generation
                    && self.is(&CaptureState::Initializing).await
                {
                    self.do_start().await;
                }
            }
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    async fn do_open(&mut self) {
        if !self.is(&CaptureState::Idle).await {
            debug!("Open ignored; session already open");
            return;
        }

        if self.ensure_decoder().await {
            self.set_state(CaptureState::Initializing).await;
        }
    }

    async fn do_start(&mut self) {
        match self.current().await {
            CaptureState::Scanning => return,
            CaptureState::Idle => {
                self.do_open().await;
                if !self.is(&CaptureState::Initializing).await {
                    return;
                }
            }
            _ => {}
        }

        self.cancel_timer();
        if !self.ensure_decoder().await {
            return;
        }

        let (epoch, token) = self.gate.snapshot();
        if epoch != self.applied_epoch {
            return;
        }

        let generation = self.next_generation();
        let sink = DecodeSink::new(generation, self.events_tx.clone());

        let outcome = match self.decoder.as_mut() {
            Some(decoder) => {
                tokio::select! {
                    result = decoder.start(&self.settings, sink) => Some(result),
                    _ = token.cancelled() => None,
                }
            }
            None => return,
        };

        match outcome {
            None => {
                info!("Start cancelled by close");
                self.halt_decoder().await;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Decoder start failed");
                self.halt_decoder().await;
                self.set_state(CaptureState::Error(e)).await;
            }
            Some(Ok(())) => {
                if self.gate.epoch() != self.applied_epoch {
                    self.halt_decoder().await;
                    return;
                }
                info!(generation, "Scanning");
                self.set_state(CaptureState::Scanning).await;
            }
        }
    }

    async fn do_stop(&mut self) {
        if !self.is(&CaptureState::Scanning).await {
            return;
        }
        self.next_generation();

        let (_, token) = self.gate.snapshot();
        let outcome = match self.decoder.as_mut() {
            Some(decoder) => {
                tokio::select! {
                    result = decoder.stop() => Some(result),
                    _ = token.cancelled() => None,
                }
            }
            None => Some(Ok(())),
        };

        match outcome {
            None => info!("Stop cancelled by close"),
            Some(Ok(())) => self.set_state(CaptureState::Stopped).await,
            Some(Err(e)) => {
                warn!(error = %e, "Decoder stop failed");
                self.discard_decoder();
                self.set_state(CaptureState::Error(e)).await;
            }
        }
    }

    async fn do_retry(&mut self) {
        self.cancel_timer();

        if self.is(&CaptureState::Scanning).await {
            self.halt_decoder().await;
        }
        self.next_generation();

        if !self.ensure_decoder().await {
            return;
        }

        self.set_state(CaptureState::Initializing).await;
        self.schedule(self.settings.retry_delay(), |generation| {
            Event::RetrySettled { generation }
        });
    }

    async fn do_close(&mut self) {
        self.cancel_timer();
        self.next_generation();

        if let Some(mut decoder) = self.decoder.take() {
            if decoder.is_active() {
                if let Err(e) = decoder.stop().await {
                    warn!(error = %e, "Decoder stop failed during close");
                }
            }
            debug!("Decoder released");
        }

        self.set_state(CaptureState::Idle).await;
    }

    async fn on_decoded(&mut self, text: String) {
        // Later decodes from this session are now stale.
        self.next_generation();
        self.halt_decoder().await;

        info!(%text, "Barcode decoded");
        self.set_state(CaptureState::Success(text.clone())).await;
        self.observer.on_scan(&text);

        self.schedule(self.settings.auto_close(), |generation| {
            Event::AutoCloseElapsed { generation }
        });
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Constructs the decoder if missing. On failure moves to `Error`.
    async fn ensure_decoder(&mut self) -> bool {
        if self.decoder.is_some() {
            return true;
        }

        match self.factory.create(&self.settings.symbologies) {
            Ok(decoder) => {
                debug!(symbologies = self.settings.symbologies.len(), "Decoder constructed");
                self.decoder = Some(decoder);
                true
            }
            Err(e) => {
                let e = match e {
                    CaptureError::InitFailed(_) => e,
                    other => CaptureError::InitFailed(other.to_string()),
                };
                warn!(error = %e, "Decoder construction failed");
                self.set_state(CaptureState::Error(e)).await;
                false
            }
        }
    }

    /// Stops the decoder if it is running, keeping the instance. A decoder
    /// that fails to stop is discarded.
    async fn halt_decoder(&mut self) {
        if let Some(decoder) = self.decoder.as_mut() {
            if decoder.is_active() {
                if let Err(e) = decoder.stop().await {
                    warn!(error = %e, "Decoder stop failed");
                    self.discard_decoder();
                }
            }
        }
    }

    /// Drops the decoder so the next start constructs a fresh one. Dropping
    /// releases the camera even when `stop()` could not.
    fn discard_decoder(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            if decoder.is_active() {
                warn!("Discarding decoder that is still active");
            } else {
                debug!("Decoder discarded");
            }
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn schedule(&mut self, delay: Duration, make: fn(u64) -> Event) {
        self.cancel_timer();
        let generation = self.generation;
        let events = self.events_tx.clone();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(make(generation)).await;
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    async fn current(&self) -> CaptureState {
        self.state.read().await.clone()
    }

    async fn is(&self, state: &CaptureState) -> bool {
        *self.state.read().await == *state
    }

    async fn set_state(&self, next: CaptureState) {
        {
            let mut state = self.state.write().await;
            if *state == next {
                return;
            }
            debug!(from = %*state, to = %next, "Capture state change");
            *state = next.clone();
        }
        self.observer.on_state(&next);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    use crate::symbology::Symbology;

    const CODE: &str = "0123456789128";

    /// Shared script and recorder for the fake decoder.
    #[derive(Default)]
    struct Script {
        start_results: Mutex<VecDeque<CaptureResult<()>>>,
        start_delay: Mutex<Option<Duration>>,
        stop_results: Mutex<VecDeque<CaptureResult<()>>>,
        fail_create: AtomicBool,
        created: AtomicUsize,
        starts: AtomicUsize,
        stops: AtomicUsize,
        active: AtomicBool,
        sink: Mutex<Option<DecodeSink>>,
    }

    impl Script {
        fn push_start(&self, result: CaptureResult<()>) {
            self.start_results.lock().unwrap().push_back(result);
        }

        fn sink(&self) -> DecodeSink {
            self.sink.lock().unwrap().clone().expect("decoder was started")
        }

        fn emit(&self, text: &str) {
            self.sink().decoded(text);
        }

        fn active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn count(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    struct FakeDecoder {
        script: Arc<Script>,
    }

    #[async_trait]
    impl Decoder for FakeDecoder {
        async fn start(&mut self, _settings: &CaptureSettings, sink: DecodeSink) -> CaptureResult<()> {
            self.script.starts.fetch_add(1, Ordering::SeqCst);
            let delay = *self.script.start_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let result = self
                .script
                .start_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()));

            if result.is_ok() {
                self.script.active.store(true, Ordering::SeqCst);
                *self.script.sink.lock().unwrap() = Some(sink);
            }
            result
        }

        async fn stop(&mut self) -> CaptureResult<()> {
            self.script.stops.fetch_add(1, Ordering::SeqCst);
            let result = self
                .script
                .stop_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()));
            if result.is_ok() {
                self.script.active.store(false, Ordering::SeqCst);
            }
            result
        }

        fn is_active(&self) -> bool {
            self.script.active()
        }
    }

    impl Drop for FakeDecoder {
        fn drop(&mut self) {
            self.script.active.store(false, Ordering::SeqCst);
        }
    }

    struct FakeFactory {
        script: Arc<Script>,
    }

    impl DecoderFactory for FakeFactory {
        fn create(&self, symbologies: &[Symbology]) -> CaptureResult<Box<dyn Decoder>> {
            assert!(!symbologies.is_empty());
            if self.script.fail_create.load(Ordering::SeqCst) {
                return Err(CaptureError::InitFailed("no decoder library".into()));
            }
            self.script.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeDecoder {
                script: self.script.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<CaptureState>>,
        scans: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn states(&self) -> Vec<CaptureState> {
            self.states.lock().unwrap().clone()
        }

        fn scans(&self) -> Vec<String> {
            self.scans.lock().unwrap().clone()
        }
    }

    impl CaptureObserver for Recorder {
        fn on_state(&self, state: &CaptureState) {
            self.states.lock().unwrap().push(state.clone());
        }

        fn on_scan(&self, text: &str) {
            self.scans.lock().unwrap().push(text.to_string());
        }
    }

    fn setup() -> (CaptureHandle, Arc<Script>, Arc<Recorder>) {
        let script = Arc::new(Script::default());
        let recorder = Arc::new(Recorder::default());
        let handle = CaptureController::spawn(
            CaptureSettings::default(),
            Arc::new(FakeFactory {
                script: script.clone(),
            }),
            recorder.clone(),
        );
        (handle, script, recorder)
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_end_to_end() {
        let (handle, script, recorder) = setup();

        assert_eq!(handle.open().await.unwrap(), CaptureState::Initializing);
        assert_eq!(handle.start().await.unwrap(), CaptureState::Scanning);
        assert!(handle.is_scanning().await);

        script.emit(CODE);
        settle(10).await;

        assert_eq!(handle.state().await, CaptureState::Success(CODE.into()));
        assert_eq!(recorder.scans(), vec![CODE]);
        assert!(!script.active(), "frame loop stopped after success");

        // A second decode from the same session is ignored
        script.emit(CODE);
        settle(1300).await;
        assert_eq!(handle.state().await, CaptureState::Success(CODE.into()));

        settle(300).await;
        assert_eq!(handle.state().await, CaptureState::Idle);
        assert_eq!(recorder.scans(), vec![CODE]);
        assert_eq!(
            recorder.states(),
            vec![
                CaptureState::Initializing,
                CaptureState::Scanning,
                CaptureState::Success(CODE.into()),
                CaptureState::Idle,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_is_idle() {
        let (handle, _script, recorder) = setup();

        assert_eq!(handle.close().await.unwrap(), CaptureState::Idle);
        assert_eq!(handle.close().await.unwrap(), CaptureState::Idle);

        handle.start().await.unwrap();
        assert_eq!(handle.close().await.unwrap(), CaptureState::Idle);
        assert_eq!(handle.close().await.unwrap(), CaptureState::Idle);

        let idles = recorder
            .states()
            .into_iter()
            .filter(|s| *s == CaptureState::Idle)
            .count();
        assert_eq!(idles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_after_close_is_discarded() {
        let (handle, script, recorder) = setup();
        handle.start().await.unwrap();
        let late_sink = script.sink();

        handle.close().await.unwrap();
        late_sink.decoded(CODE);
        settle(50).await;

        assert!(recorder.scans().is_empty());
        assert_eq!(handle.state().await, CaptureState::Idle);
        assert!(!script.active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_from_previous_session_is_discarded() {
        let (handle, script, recorder) = setup();
        handle.start().await.unwrap();
        let old_sink = script.sink();

        handle.close().await.unwrap();
        handle.start().await.unwrap();

        old_sink.decoded("stale");
        settle(10).await;
        assert_eq!(handle.state().await, CaptureState::Scanning);
        assert!(recorder.scans().is_empty());

        script.emit(CODE);
        settle(10).await;
        assert_eq!(recorder.scans(), vec![CODE]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_leaves_decoder_inactive() {
        let (handle, script, _recorder) = setup();
        script.push_start(Err(CaptureError::PermissionDenied));

        let state = handle.start().await.unwrap();
        assert_eq!(state, CaptureState::Error(CaptureError::PermissionDenied));
        assert!(!script.active());

        // Retry clears the error and restarts after the settle delay
        assert_eq!(handle.retry().await.unwrap(), CaptureState::Initializing);
        settle(50).await;
        assert_eq!(handle.state().await, CaptureState::Initializing);
        settle(60).await;
        assert_eq!(handle.state().await, CaptureState::Scanning);

        assert_eq!(Script::count(&script.created), 1);
        assert_eq!(Script::count(&script.starts), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_construction_failure_then_retry() {
        let (handle, script, _recorder) = setup();
        script.fail_create.store(true, Ordering::SeqCst);

        let state = handle.open().await.unwrap();
        assert!(matches!(state, CaptureState::Error(CaptureError::InitFailed(_))));

        script.fail_create.store(false, Ordering::SeqCst);
        handle.retry().await.unwrap();
        settle(150).await;

        assert_eq!(handle.state().await, CaptureState::Scanning);
        assert_eq!(Script::count(&script.created), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_while_scanning_restarts() {
        let (handle, script, _recorder) = setup();
        handle.start().await.unwrap();

        handle.retry().await.unwrap();
        assert!(!script.active());
        settle(150).await;

        assert_eq!(handle.state().await, CaptureState::Scanning);
        assert_eq!(Script::count(&script.starts), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_decoder_for_restart() {
        let (handle, script, _recorder) = setup();

        // Not scanning: no-op
        assert_eq!(handle.stop().await.unwrap(), CaptureState::Idle);

        handle.start().await.unwrap();
        assert_eq!(handle.stop().await.unwrap(), CaptureState::Stopped);
        assert!(!script.active());

        assert_eq!(handle.start().await.unwrap(), CaptureState::Scanning);
        assert_eq!(Script::count(&script.created), 1);
        assert_eq!(Script::count(&script.starts), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stop_discards_decoder() {
        let (handle, script, recorder) = setup();

        handle.start().await.unwrap();
        let old_sink = script.sink();
        script
            .stop_results
            .lock()
            .unwrap()
            .push_back(Err(CaptureError::DeviceBusy));

        assert_eq!(
            handle.stop().await.unwrap(),
            CaptureState::Error(CaptureError::DeviceBusy)
        );
        assert!(!script.active(), "decoder left running after a failed stop");

        old_sink.decoded(CODE);
        settle(10).await;
        assert!(recorder.scans().is_empty());

        assert_eq!(handle.retry().await.unwrap(), CaptureState::Initializing);
        settle(200).await;
        assert_eq!(handle.state().await, CaptureState::Scanning);
        assert_eq!(Script::count(&script.created), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_and_start_are_idempotent() {
        let (handle, script, _recorder) = setup();

        handle.open().await.unwrap();
        handle.open().await.unwrap();
        assert_eq!(Script::count(&script.created), 1);

        handle.start().await.unwrap();
        handle.start().await.unwrap();
        assert_eq!(Script::count(&script.starts), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_start() {
        let (handle, script, recorder) = setup();
        *script.start_delay.lock().unwrap() = Some(Duration::from_secs(5));

        let starter = handle.clone();
        let pending = tokio::spawn(async move { starter.start().await });
        settle(10).await;

        assert_eq!(handle.close().await.unwrap(), CaptureState::Idle);
        pending.await.unwrap().unwrap();
        settle(10_000).await;

        assert_eq!(handle.state().await, CaptureState::Idle);
        assert!(!script.active());
        assert!(!recorder.states().contains(&CaptureState::Scanning));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_auto_close_timer() {
        let (handle, script, _recorder) = setup();
        handle.start().await.unwrap();
        script.emit(CODE);
        settle(100).await;

        handle.close().await.unwrap();
        settle(100).await;
        handle.start().await.unwrap();

        // The first session's auto-close would have fired at ~1.5s
        settle(1600).await;
        assert_eq!(handle.state().await, CaptureState::Scanning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_handle() {
        let (handle, script, _recorder) = setup();
        handle.start().await.unwrap();

        handle.shutdown().await.unwrap();
        settle(10).await;

        assert!(!script.active());
        assert_eq!(handle.start().await, Err(CaptureError::ControllerClosed));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CaptureState::Idle.to_string(), "idle");
        assert_eq!(CaptureState::Success("42".into()).to_string(), "success(42)");
        assert_eq!(
            CaptureState::Error(CaptureError::NoCamera).to_string(),
            "error(No camera available)"
        );
    }
}
