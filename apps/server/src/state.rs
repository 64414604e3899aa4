//! Shared application state.

use std::sync::Arc;

use stockroom_db::Database;

use crate::config::StockroomConfig;
use crate::events::ChangeFeed;

/// Everything a handler can reach. Shared as `Arc<AppState>`.
pub struct AppState {
    pub db: Database,
    pub config: StockroomConfig,
    pub changes: ChangeFeed,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: StockroomConfig) -> SharedState {
        let changes = ChangeFeed::new(config.server.event_buffer);
        Arc::new(AppState {
            db,
            config,
            changes,
        })
    }
}
