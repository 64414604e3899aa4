//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler / CLI                                                    │
//! │       │                                                                 │
//! │       │  db.products().search("leche")                                 │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── create(&self, NewProduct)                                         │
//! │  ├── list / get_by_id / get_by_barcode                                 │
//! │  ├── update(&self, id, ProductPatch)                                   │
//! │  └── delete / search / categories                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search
//! - [`UserRepository`](user::UserRepository) - Account records

pub mod product;
pub mod user;
