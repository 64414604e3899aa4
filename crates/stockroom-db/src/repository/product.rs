//! # Product Repository
//!
//! Database operations for the `inventory_products` table.
//!
//! ## Key Operations
//! - CRUD, with partial updates merged inside a transaction
//! - Newest-first listing
//! - Case-insensitive search over name, barcode and category
//! - Barcode lookup for the scan flow
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Search Works                                     │
//! │                                                                         │
//! │  User types: "LÁCT"                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_search_query → "LÁCT" (trimmed, ≤ 100 chars)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  list() newest-first ──► catalog::matches_text("láct")                 │
//! │                                                                         │
//! │  SQLite's LIKE/lower() only fold ASCII, so "Lácteos" would miss        │
//! │  "LÁCT". Filtering with Rust's Unicode lowercase keeps search and      │
//! │  the client-side list filter on the exact same rule.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockroom_core::catalog::matches_text;
use stockroom_core::validation::validate_search_query;
use stockroom_core::{NewProduct, Product, ProductFilter, ProductPatch};

const COLUMNS: &str = "id, name, barcode, description, price_cents, cost_cents, \
                       stock, min_stock, category_name, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let created = repo.create(NewProduct::new("Arroz 1kg", "1.80".parse()?)).await?;
/// let found = repo.get_by_id(created.id).await?;
/// let hits = repo.search("arroz").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product. The store assigns `id`, `created_at`, `updated_at`.
    ///
    /// The input is validated (and optional text normalized) first.
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        let input = input.validate()?;
        let now = Utc::now();

        let sql = format!(
            "INSERT INTO inventory_products \
             (name, barcode, description, price_cents, cost_cents, stock, min_stock, \
              category_name, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
             RETURNING {COLUMNS}"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&input.name)
            .bind(&input.barcode)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.cost)
            .bind(input.stock)
            .bind(input.min_stock)
            .bind(&input.category_name)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        info!(id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// All products, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM inventory_products ORDER BY created_at DESC, id DESC"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM inventory_products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets the newest product carrying exactly this barcode.
    ///
    /// Barcodes are not unique in the schema; when several records share one
    /// the most recently created wins.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM inventory_products WHERE barcode = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        debug!(%barcode, found = product.is_some(), "Barcode lookup");
        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// Read, merge and write happen in one transaction so two concurrent
    /// patches to different fields don't lose each other's changes.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no product with this id
    /// * `DbError::Validation` - merged record breaks a field rule
    pub async fn update(&self, id: i64, patch: ProductPatch) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM inventory_products WHERE id = ?1");
        let current = sqlx::query_as::<_, Product>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let merged = current.apply_patch(patch)?;

        let update = format!(
            "UPDATE inventory_products SET \
             name = ?1, barcode = ?2, description = ?3, price_cents = ?4, cost_cents = ?5, \
             stock = ?6, min_stock = ?7, category_name = ?8, updated_at = ?9 \
             WHERE id = ?10 \
             RETURNING {COLUMNS}"
        );

        let updated = sqlx::query_as::<_, Product>(&update)
            .bind(&merged.name)
            .bind(&merged.barcode)
            .bind(&merged.description)
            .bind(merged.price)
            .bind(merged.cost)
            .bind(merged.stock)
            .bind(merged.min_stock)
            .bind(&merged.category_name)
            .bind(Utc::now())
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id, "Product updated");
        Ok(updated)
    }

    /// Deletes a product. Deleting a missing id is a no-op.
    ///
    /// ## Returns
    /// `true` if a row was removed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        info!(id, removed, "Product delete");
        Ok(removed)
    }

    /// Products whose name, barcode or category contains `query`,
    /// case-insensitively, newest first. An empty query returns everything.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        let products = self.list().await?;

        if query.is_empty() {
            return Ok(products);
        }

        let needle = query.to_lowercase();
        let hits: Vec<Product> = products
            .into_iter()
            .filter(|p| matches_text(p, &needle))
            .collect();

        debug!(query = %query, count = hits.len(), "Search returned products");
        Ok(hits)
    }

    /// Products a list-view filter leaves visible, newest first.
    ///
    /// The text part goes through [`search`](Self::search) so the query
    /// length rule applies; category and stock filters run over the hits.
    pub async fn list_filtered(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let products = match filter.q.as_deref() {
            Some(q) => self.search(q).await?,
            None => self.list().await?,
        };

        let rest = ProductFilter {
            q: None,
            ..filter.clone()
        };
        if rest.is_empty() {
            return Ok(products);
        }

        Ok(products.into_iter().filter(|p| rest.matches(p)).collect())
    }

    /// Number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Distinct non-empty category names, sorted.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category_name FROM inventory_products \
             WHERE category_name IS NOT NULL AND category_name <> '' \
             ORDER BY category_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
