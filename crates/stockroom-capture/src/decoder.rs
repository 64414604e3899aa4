//! # Decoder Abstraction
//!
//! The barcode decoder is an opaque capability behind the [`Decoder`] trait,
//! so the controller's state machine runs the same against a camera, a
//! keyboard wedge, or a scripted fake in tests.
//!
//! ## Callback Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Decoder (any thread/task)          Controller actor                    │
//! │  ─────────────────────────          ────────────────                    │
//! │  sink.decoded("0123456789128") ──►  Event::Decoded { generation, .. }   │
//! │  sink.tick()                   ──►  Event::Tick { generation }          │
//! │                                                                         │
//! │  Every sink is stamped with the session generation it was handed out   │
//! │  for. Events from an older generation are dropped by the controller.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use crate::controller::Event;
use crate::error::CaptureResult;
use crate::settings::CaptureSettings;
use crate::symbology::Symbology;

/// A barcode decoder bound to a capture surface.
///
/// The controller calls these from its single actor task, never
/// concurrently.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Acquires the camera and begins analyzing frames.
    ///
    /// On error the decoder must end up inactive.
    async fn start(&mut self, settings: &CaptureSettings, sink: DecodeSink) -> CaptureResult<()>;

    /// Halts analysis and releases the camera. The decoder stays usable.
    async fn stop(&mut self) -> CaptureResult<()>;

    fn is_active(&self) -> bool;
}

/// Constructs decoders bound to a symbology set.
pub trait DecoderFactory: Send + Sync {
    fn create(&self, symbologies: &[Symbology]) -> CaptureResult<Box<dyn Decoder>>;
}

/// Callback pair handed to [`Decoder::start`].
///
/// Cheap to clone; never blocks. Safe to call from threads outside the
/// runtime, such as a camera driver's callback thread.
#[derive(Debug, Clone)]
pub struct DecodeSink {
    generation: u64,
    events: mpsc::Sender<Event>,
    /// Runtime the sink was created on, for deferred sends.
    runtime: Option<Handle>,
}

impl DecodeSink {
    pub(crate) fn new(generation: u64, events: mpsc::Sender<Event>) -> Self {
        DecodeSink {
            generation,
            events,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Reports decoded text (onDecode).
    pub fn decoded(&self, text: impl Into<String>) {
        let event = Event::Decoded {
            generation: self.generation,
            text: text.into(),
        };

        match self.events.try_send(event) {
            Ok(()) => {}
            // Ticks may have filled the queue; a decode must not be lost.
            Err(TrySendError::Full(event)) => match &self.runtime {
                Some(runtime) => {
                    let events = self.events.clone();
                    let generation = self.generation;
                    runtime.spawn(async move {
                        if events.send(event).await.is_err() {
                            debug!(generation, "Controller exited before a queued decode");
                        }
                    });
                }
                None => {
                    warn!(generation = self.generation, "Decode dropped; queue full and no runtime");
                }
            },
            Err(TrySendError::Closed(_)) => {
                warn!(generation = self.generation, "Decode reported after controller exit");
            }
        }
    }

    /// Reports a frame with nothing found (onTick). Dropped under backpressure.
    pub fn tick(&self) {
        if self
            .events
            .try_send(Event::Tick {
                generation: self.generation,
            })
            .is_err()
        {
            trace!("Tick dropped");
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
