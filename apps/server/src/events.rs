//! # Change Feed
//!
//! Store mutations are announced on a broadcast channel so clients that
//! cache the product list know when to refetch.
//!
//! ```text
//! ┌──────────────┐  publish   ┌──────────────────────┐  subscribe  ┌──────────┐
//! │ POST/PUT/    │──────────► │ broadcast::Sender    │───────────► │ SSE      │
//! │ PATCH/DELETE │            │ <ProductChange>      │             │ clients  │
//! └──────────────┘            └──────────────────────┘             └──────────┘
//! ```
//!
//! Publishing happens only after the store call succeeded. A subscriber that
//! falls behind by more than the buffer skips the missed events; the next
//! event it does receive is still a valid refetch trigger.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use stockroom_core::Product;

/// A committed store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProductChange {
    Created { product: Product },
    Updated { product: Product },
    Deleted { id: i64 },
}

impl ProductChange {
    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            ProductChange::Created { .. } => "created",
            ProductChange::Updated { .. } => "updated",
            ProductChange::Deleted { .. } => "deleted",
        }
    }

    pub fn product_id(&self) -> i64 {
        match self {
            ProductChange::Created { product } | ProductChange::Updated { product } => product.id,
            ProductChange::Deleted { id } => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ProductChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Announces a change. Returns how many subscribers will see it.
    pub fn publish(&self, change: ProductChange) -> usize {
        let kind = change.kind();
        let id = change.product_id();
        match self.tx.send(change) {
            Ok(receivers) => {
                debug!(kind, id, receivers, "Product change published");
                receivers
            }
            // No subscribers.
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProductChange> {
        self.tx.subscribe()
    }

    /// Server-Sent Events stream over a fresh subscription.
    pub fn sse(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        let stream = BroadcastStream::new(self.subscribe()).filter_map(|msg| match msg {
            Ok(change) => {
                let data = serde_json::to_string(&change).unwrap_or_else(|_| "{}".to_string());
                Some(Ok(Event::default().event(change.kind()).data(data)))
            }
            Err(e) => {
                warn!(error = %e, "SSE subscriber lagged");
                None
            }
        });

        Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
    }
}
