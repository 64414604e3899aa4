//! # stockroom-capture: Barcode Capture for Stockroom
//!
//! Manages a single camera-decoding session and translates its asynchronous
//! events into a small state machine the rest of the application reacts to.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Capture State Machine                            │
//! │                                                                         │
//! │   ┌──────┐  open()  ┌──────────────┐  start() ok  ┌──────────┐        │
//! │   │ Idle │─────────►│ Initializing │─────────────►│ Scanning │        │
//! │   └──────┘          └──────┬───────┘              └────┬─────┘        │
//! │      ▲                     │ start() err               │              │
//! │      │                     ▼                 decode    │  stop()      │
//! │      │               ┌──────────┐          ┌───────────┤              │
//! │      │               │  Error   │          ▼           ▼              │
//! │      │               └────┬─────┘   ┌──────────┐  ┌─────────┐        │
//! │      │         retry()    │         │ Success  │  │ Stopped │        │
//! │      │   (settle 100ms)   │         └────┬─────┘  └─────────┘        │
//! │      │                    ▼              │ auto-close 1.5s           │
//! │      │               Initializing        │                            │
//! │      └───────────────────────────────────┘                            │
//! │                                                                         │
//! │   close() from ANY state → Idle (decoder released, timers cancelled)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`controller`] - `CaptureController` actor, `CaptureHandle`, state, observer
//! - [`decoder`] - `Decoder` / `DecoderFactory` traits and the `DecodeSink`
//! - [`frame_loop`] - Bounded-rate `FrameLoopDecoder` and the keyboard-wedge source
//! - [`settings`] - `CaptureSettings` (fps, region, timers)
//! - [`symbology`] - Supported barcode formats
//! - [`error`] - `CaptureError`
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockroom_capture::{wedge_channel, CaptureController, CaptureSettings, NoOpObserver};
//!
//! let (lines, factory) = wedge_channel(32);
//! let handle = CaptureController::spawn(
//!     CaptureSettings::default(),
//!     Arc::new(factory),
//!     Arc::new(NoOpObserver),
//! );
//!
//! handle.start().await?;
//! lines.send("0123456789128".into()).await?;
//! ```

pub mod controller;
pub mod decoder;
pub mod error;
pub mod frame_loop;
pub mod settings;
pub mod symbology;

pub use controller::{CaptureController, CaptureHandle, CaptureObserver, CaptureState, NoOpObserver};
pub use decoder::{DecodeSink, Decoder, DecoderFactory};
pub use error::{CaptureError, CaptureResult};
pub use frame_loop::{wedge_channel, FrameLoopDecoder, FrameSource, WedgeDecoderFactory, WedgeSource};
pub use settings::{CameraFacing, CaptureRegion, CaptureSettings};
pub use symbology::Symbology;
