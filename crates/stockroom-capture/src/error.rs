//! # Capture Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Permission        Device                Init              Lifecycle    │
//! │  ──────────        ──────                ────              ─────────    │
//! │  PermissionDenied  NoCamera              InitFailed        Controller   │
//! │                    DeviceBusy                              Closed       │
//! │                                                                         │
//! │  ◄──────────── recoverable, shown with a retry action ───────────►      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-frame misses are not errors; they arrive as ticks and are never
//! surfaced.

use thiserror::Error;

/// Result type alias for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Capture failure.
///
/// `Clone + PartialEq` because the error is carried inside
/// [`CaptureState::Error`](crate::CaptureState::Error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Camera access was refused.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// No capture device is available.
    #[error("No camera available")]
    NoCamera,

    /// The device or decoder is already in use.
    #[error("Camera or decoder is busy")]
    DeviceBusy,

    /// The decoder could not be constructed or started.
    #[error("Decoder initialization failed: {0}")]
    InitFailed(String),

    /// The controller task is gone.
    #[error("Capture controller is closed")]
    ControllerClosed,
}

impl CaptureError {
    /// Message suitable for showing next to a retry button.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::PermissionDenied => {
                "Camera access was denied. Allow camera access and try again.".to_string()
            }
            CaptureError::NoCamera => {
                "No camera was found. Connect a camera or scanner and try again.".to_string()
            }
            CaptureError::DeviceBusy => {
                "The camera is in use by another application. Close it and try again.".to_string()
            }
            CaptureError::InitFailed(reason) => {
                format!("The barcode scanner could not start ({reason}). Try again.")
            }
            CaptureError::ControllerClosed => "The scanner was closed.".to_string(),
        }
    }

    /// True when `retry()` can reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CaptureError::ControllerClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(CaptureError::PermissionDenied.is_recoverable());
        assert!(CaptureError::NoCamera.is_recoverable());
        assert!(CaptureError::DeviceBusy.is_recoverable());
        assert!(CaptureError::InitFailed("x".into()).is_recoverable());

        assert!(!CaptureError::ControllerClosed.is_recoverable());
    }

    #[test]
    fn test_user_message_mentions_reason() {
        let err = CaptureError::InitFailed("unsupported format".into());
        assert!(err.user_message().contains("unsupported format"));
        assert!(CaptureError::PermissionDenied.user_message().contains("denied"));
    }
}
