//! # stockroom-core: Pure Domain Logic for Stockroom
//!
//! Everything here is deterministic and free of I/O: the product record,
//! the fixed-point [`Money`] type, input validation, and the list-side
//! computations (filtering, stock status, inventory statistics).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         Web client / scan station / export CLI                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (axum)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  catalog  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  filters  │  │   rules   │  │   │
//! │  │   │  Patch    │  │  "12.50"  │  │  stats    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockroom-db / stockroom-export                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, NewProduct, ProductPatch, User
//! - [`money`] - Fixed-point money (integer cents, decimal-string wire format)
//! - [`catalog`] - List filtering, stock status, inventory statistics
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price: Money = "12.50".parse().unwrap();
//! assert_eq!(price.cents(), 1250);
//! assert_eq!(price.to_string(), "12.50");
//! ```

pub mod catalog;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use catalog::{CategoryFilter, InventoryStats, ProductFilter, StockFilter, StockStatus};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest amount a price or cost may hold: 99,999,999.99.
///
/// Matches the `numeric(10,2)` column the catalog was originally kept in.
pub const MAX_MONEY_CENTS: i64 = 9_999_999_999;

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a barcode string.
pub const MAX_BARCODE_LEN: usize = 100;

/// Maximum length of a category name.
pub const MAX_CATEGORY_LEN: usize = 100;

/// Maximum length of a search query.
pub const MAX_QUERY_LEN: usize = 100;
