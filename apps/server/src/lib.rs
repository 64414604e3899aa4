//! # Stockroom Server
//!
//! HTTP API, change feed and command-line front ends over the stockroom
//! crates.
//!
//! ## Module Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  config   StockroomConfig: TOML file + STOCKROOM_* overrides            │
//! │  state    AppState { db, config, changes }                              │
//! │  routes   axum handlers (products, export, health)                      │
//! │  events   ChangeFeed: broadcast of committed mutations, SSE             │
//! │  error    ApiError { code, message } → JSON + status                    │
//! │  scan     keyboard-wedge scan station                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod routes;
pub mod scan;
pub mod state;

pub use config::{ConfigError, StockroomConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use events::{ChangeFeed, ProductChange};
pub use routes::router;
pub use state::{AppState, SharedState};

use tracing::info;

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
