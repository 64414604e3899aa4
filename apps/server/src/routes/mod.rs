//! # HTTP Routes
//!
//! ```text
//! /health                                GET
//! /api/products                          GET (q, category, stock), POST
//! /api/products/search                   GET (q)
//! /api/products/stats                    GET
//! /api/products/categories               GET
//! /api/products/events                   GET (text/event-stream)
//! /api/products/barcode/{code}           GET
//! /api/products/{id}                     GET, PUT, PATCH, DELETE
//! /api/export/xlsx                       GET (q, category, stock)
//! /api/export/sql                        GET (q, category, stock)
//! ```

pub mod export;
pub mod health;
pub mod products;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

/// Builds the full application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/products", products::router())
        .nest("/api/export", export::router())
        .with_state(state)
}
