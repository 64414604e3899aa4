//! # Capture Settings
//!
//! Loaded as the `[capture]` section of `stockroom.toml`:
//!
//! ```toml
//! [capture]
//! fps = 30
//! facing = "environment"
//! auto_close_ms = 1500
//! retry_delay_ms = 100
//! debounce_ms = 1500
//! symbologies = ["ean-13", "code-128", "qr-code"]
//!
//! [capture.region]
//! width = 250
//! height = 250
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::symbology::Symbology;

/// Which camera to prefer when several exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera on phones and tablets.
    #[default]
    Environment,
    User,
}

/// Area of the frame analyzed for a barcode, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureRegion {
    fn default() -> Self {
        CaptureRegion {
            width: 250,
            height: 250,
        }
    }
}

/// Capture controller and frame-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Frame analyses per second.
    pub fps: u32,

    pub region: CaptureRegion,

    pub facing: CameraFacing,

    /// Delay between a successful scan and the automatic close.
    pub auto_close_ms: u64,

    /// Settle delay between tearing the camera down and restarting it.
    pub retry_delay_ms: u64,

    /// Identical consecutive decodes within this window count as one scan.
    pub debounce_ms: u64,

    pub symbologies: Vec<Symbology>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            fps: 30,
            region: CaptureRegion::default(),
            facing: CameraFacing::Environment,
            auto_close_ms: 1500,
            retry_delay_ms: 100,
            debounce_ms: 1500,
            symbologies: Symbology::ALL.to_vec(),
        }
    }
}

impl CaptureSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1))).max(Duration::from_millis(1))
    }

    pub fn auto_close(&self) -> Duration {
        Duration::from_millis(self.auto_close_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Checks ranges; the message names the offending key.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=120).contains(&self.fps) {
            return Err(format!("capture.fps must be 1-120, got {}", self.fps));
        }
        if self.region.width == 0 || self.region.height == 0 {
            return Err("capture.region must be non-empty".to_string());
        }
        if self.symbologies.is_empty() {
            return Err("capture.symbologies must list at least one format".to_string());
        }
        Ok(())
    }
}
