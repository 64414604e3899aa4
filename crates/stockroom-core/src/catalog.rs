//! # Catalog Module
//!
//! Computations over a product collection: text search, category and
//! stock-status filtering, the category list, and inventory statistics.
//! None of this is persisted; everything is derived from the current
//! snapshot the store returns.
//!
//! ## Stock Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock == 0                 → OutOfStock   "Sin Stock"                  │
//! │  0 < stock <= min_stock     → LowStock     "Stock Bajo"                 │
//! │  stock > min_stock          → InStock      "En Stock"                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Stock Status
// =============================================================================

/// Stock classification of a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Classifies a stock level against its reorder threshold.
    ///
    /// ```rust
    /// use stockroom_core::StockStatus;
    ///
    /// assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
    /// assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
    /// assert_eq!(StockStatus::classify(6, 5), StockStatus::InStock);
    /// ```
    pub fn classify(stock: i64, min_stock: i64) -> Self {
        if stock <= 0 {
            StockStatus::OutOfStock
        } else if stock <= min_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn of(product: &Product) -> Self {
        StockStatus::classify(product.stock, product.min_stock)
    }

    /// Label shown in the product list.
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "En Stock",
            StockStatus::LowStock => "Stock Bajo",
            StockStatus::OutOfStock => "Sin Stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "in-stock"),
            StockStatus::LowStock => write!(f, "low-stock"),
            StockStatus::OutOfStock => write!(f, "out-of-stock"),
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Stock-status filter for the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockFilter {
    #[default]
    All,
    InStock,
    LowStock,
    OutOfStock,
}

impl StockFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            StockFilter::All => true,
            StockFilter::InStock => StockStatus::of(product) == StockStatus::InStock,
            StockFilter::LowStock => StockStatus::of(product) == StockStatus::LowStock,
            StockFilter::OutOfStock => StockStatus::of(product) == StockStatus::OutOfStock,
        }
    }
}

impl FromStr for StockFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StockFilter::All),
            "in-stock" => Ok(StockFilter::InStock),
            "low-stock" => Ok(StockFilter::LowStock),
            "out-of-stock" => Ok(StockFilter::OutOfStock),
            other => Err(ValidationError::InvalidFormat {
                field: "stock".to_string(),
                reason: format!(
                    "'{}' is not one of all, in-stock, low-stock, out-of-stock",
                    other
                ),
            }),
        }
    }
}

/// Category filter for the list view.
///
/// Query-string form: `all`, `uncategorized`, or an exact category name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Uncategorized,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => product.category_name.is_none(),
            CategoryFilter::Named(name) => product.category_name.as_deref() == Some(name.as_str()),
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "all" => CategoryFilter::All,
            "uncategorized" => CategoryFilter::Uncategorized,
            _ => CategoryFilter::Named(value),
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Uncategorized => "uncategorized".to_string(),
            CategoryFilter::Named(name) => name,
        }
    }
}

/// Combined list filter: text query AND category AND stock status.
///
/// Deserializes straight from a query string
/// (`?q=leche&category=Lácteos&stock=low-stock`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Case-insensitive substring over name, barcode and category.
    pub q: Option<String>,
    pub category: CategoryFilter,
    pub stock: StockFilter,
}

impl ProductFilter {
    /// Filter that only applies a text query.
    pub fn query(q: impl Into<String>) -> Self {
        ProductFilter {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    /// True when nothing would be filtered out.
    pub fn is_empty(&self) -> bool {
        self.q.as_deref().map_or(true, |q| q.trim().is_empty())
            && self.category == CategoryFilter::All
            && self.stock == StockFilter::All
    }

    /// Applies the filter, preserving input order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let needle = self.needle();
        products
            .iter()
            .filter(|p| self.matches_with(p, needle.as_deref()))
            .collect()
    }

    /// Whether a single product passes every part of the filter.
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_with(product, self.needle().as_deref())
    }

    fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }

    fn matches_with(&self, product: &Product, needle: Option<&str>) -> bool {
        needle.map_or(true, |n| matches_text(product, n))
            && self.category.matches(product)
            && self.stock.matches(product)
    }
}

/// Case-insensitive containment test over name, barcode and category.
///
/// `needle` must already be lowercased.
pub fn matches_text(product: &Product, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&product.name)
        || product.barcode.as_deref().is_some_and(contains)
        || product.category_name.as_deref().is_some_and(contains)
}

/// Distinct category names, sorted. Products without a category are skipped.
pub fn category_names(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.category_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Inventory Statistics
// =============================================================================

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryStats {
    pub total_products: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    /// Σ price × stock, saturating at `i64::MAX` cents.
    #[ts(type = "string")]
    pub total_value: Money,
}

impl InventoryStats {
    pub fn compute(products: &[Product]) -> Self {
        products.iter().fold(
            InventoryStats {
                total_products: products.len(),
                ..Default::default()
            },
            |mut stats, p| {
                match StockStatus::of(p) {
                    StockStatus::LowStock => stats.low_stock += 1,
                    StockStatus::OutOfStock => stats.out_of_stock += 1,
                    StockStatus::InStock => {}
                }
                stats.total_value = stats.total_value.saturating_add(p.stock_value());
                stats
            },
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, name: &str, barcode: Option<&str>, category: Option<&str>) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: name.into(),
            barcode: barcode.map(Into::into),
            description: None,
            price: Money::from_cents(100),
            cost: None,
            stock: 10,
            min_stock: 2,
            category_name: category.map(Into::into),
            created_at: now,
            updated_at: now,
        }
    }

    fn with_stock(mut p: Product, stock: i64, min_stock: i64) -> Product {
        p.stock = stock;
        p.min_stock = min_stock;
        p
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
        assert_eq!(StockStatus::classify(3, 3), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(4, 3), StockStatus::InStock);
        assert_eq!(StockStatus::LowStock.label(), "Stock Bajo");
    }

    #[test]
    fn test_text_search_is_case_insensitive() {
        let products = vec![
            product(1, "Agua Mineral", Some("ABC123"), None),
            product(2, "Galletas", None, Some("Snacks abc")),
            product(3, "Jabón", Some("999"), Some("Limpieza")),
            product(4, "ÁBACO", None, None),
        ];

        let hits: Vec<i64> = ProductFilter::query("abc")
            .apply(&products)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(hits, vec![1, 2]);

        // Non-ASCII case folding
        let hits = ProductFilter::query("ábaco").apply(&products);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 4);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let products = vec![product(1, "a", None, None), product(2, "b", None, None)];
        assert_eq!(ProductFilter::query("   ").apply(&products).len(), 2);
        assert!(ProductFilter::default().is_empty());
    }

    #[test]
    fn test_category_filter() {
        let products = vec![
            product(1, "a", None, Some("Bebidas")),
            product(2, "b", None, None),
            product(3, "c", None, Some("bebidas")),
        ];

        let uncategorized = ProductFilter {
            category: CategoryFilter::from("uncategorized".to_string()),
            ..Default::default()
        };
        assert_eq!(uncategorized.apply(&products).len(), 1);

        let named = ProductFilter {
            category: CategoryFilter::Named("Bebidas".into()),
            ..Default::default()
        };
        let hits = named.apply(&products);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_stock_filter() {
        let products = vec![
            with_stock(product(1, "a", None, None), 0, 5),
            with_stock(product(2, "b", None, None), 3, 5),
            with_stock(product(3, "c", None, None), 9, 5),
        ];

        let only = |f: StockFilter| -> Vec<i64> {
            ProductFilter {
                stock: f,
                ..Default::default()
            }
            .apply(&products)
            .iter()
            .map(|p| p.id)
            .collect()
        };

        assert_eq!(only(StockFilter::OutOfStock), vec![1]);
        assert_eq!(only(StockFilter::LowStock), vec![2]);
        assert_eq!(only(StockFilter::InStock), vec![3]);
        assert_eq!(only(StockFilter::All), vec![1, 2, 3]);
    }

    #[test]
    fn test_stock_filter_parse() {
        assert_eq!("low-stock".parse::<StockFilter>().unwrap(), StockFilter::LowStock);
        assert_eq!("".parse::<StockFilter>().unwrap(), StockFilter::All);
        assert!("plenty".parse::<StockFilter>().is_err());
    }

    #[test]
    fn test_filter_from_query_string_shape() {
        let filter: ProductFilter = serde_json::from_str(
            r#"{"q": "leche", "category": "uncategorized", "stock": "out-of-stock"}"#,
        )
        .unwrap();
        assert_eq!(filter.q.as_deref(), Some("leche"));
        assert_eq!(filter.category, CategoryFilter::Uncategorized);
        assert_eq!(filter.stock, StockFilter::OutOfStock);
    }

    #[test]
    fn test_category_names_sorted_unique() {
        let products = vec![
            product(1, "a", None, Some("Snacks")),
            product(2, "b", None, Some("Bebidas")),
            product(3, "c", None, Some("Snacks")),
            product(4, "d", None, None),
        ];
        assert_eq!(category_names(&products), vec!["Bebidas", "Snacks"]);
    }

    #[test]
    fn test_inventory_stats() {
        let mut a = with_stock(product(1, "a", None, None), 0, 5);
        a.price = Money::from_cents(999);
        let mut b = with_stock(product(2, "b", None, None), 2, 5);
        b.price = Money::from_cents(1050);
        let mut c = with_stock(product(3, "c", None, None), 10, 5);
        c.price = Money::from_cents(199);

        let stats = InventoryStats::compute(&[a, b, c]);
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.low_stock, 1);
        assert_eq!(stats.total_value.cents(), 2 * 1050 + 10 * 199);
    }

    #[test]
    fn test_inventory_stats_at_field_limits() {
        let mut p = with_stock(product(1, "a", None, None), i64::from(i32::MAX), 0);
        p.price = Money::from_cents(crate::MAX_MONEY_CENTS);
        assert!(crate::validation::validate_count("stock", p.stock).is_ok());
        assert!(crate::validation::validate_amount("price", p.price).is_ok());

        let stats = InventoryStats::compute(&[p.clone(), p]);
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_value.cents(), i64::MAX);
    }
}
