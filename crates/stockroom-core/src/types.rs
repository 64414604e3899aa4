//! # Domain Types
//!
//! The product record and the payloads that create and change it.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   NewProduct    │   │    Product      │   │  ProductPatch   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │──►│  id (i64)       │◄──│  any subset     │       │
//! │  │  price (Money)  │   │  ...fields      │   │  null = clear   │       │
//! │  │  stock = 0      │   │  created_at     │   │  absent = keep  │       │
//! │  │  min_stock = 0  │   │  updated_at     │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │        insert               stored               partial update         │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │     User        │  id (UUID), username (unique), password           │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! All payloads use camelCase keys (`minStock`, `categoryName`) and money as
//! decimal strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    normalize_optional, validate_amount, validate_barcode, validate_category, validate_count,
    validate_product_name, ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier. Never changes.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Scanned or typed barcode, any symbology.
    pub barcode: Option<String>,

    pub description: Option<String>,

    /// Sale price.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    #[ts(type = "string")]
    pub price: Money,

    /// Purchase cost, if known.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cost_cents"))]
    #[ts(type = "string | null")]
    pub cost: Option<Money>,

    /// Units on hand.
    pub stock: i64,

    /// Reorder threshold. At or below this the product is "low stock".
    pub min_stock: i64,

    pub category_name: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Inventory value of this line: price × stock.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }

    /// Applies a partial update and re-validates the merged record.
    ///
    /// `id`, `created_at` and `updated_at` are left untouched; the store
    /// stamps `updated_at` when it writes.
    pub fn apply_patch(mut self, patch: ProductPatch) -> ValidationResult<Product> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(barcode) = patch.barcode {
            self.barcode = normalize_optional(barcode);
        }
        if let Some(description) = patch.description {
            self.description = normalize_optional(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(min_stock) = patch.min_stock {
            self.min_stock = min_stock;
        }
        if let Some(category_name) = patch.category_name {
            self.category_name = normalize_optional(category_name);
        }

        check_fields(&Fields {
            name: &self.name,
            barcode: self.barcode.as_deref(),
            category_name: self.category_name.as_deref(),
            price: self.price,
            cost: self.cost,
            stock: self.stock,
            min_stock: self.min_stock,
        })?;

        Ok(self)
    }
}

// =============================================================================
// New Product
// =============================================================================

/// Payload for creating a product.
///
/// ## Coercion
/// - `stock` / `minStock` accept numbers or numeric strings and default to 0
/// - `cost` accepts `null`, `""` or a money value
/// - blank optional text becomes `None` in [`NewProduct::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[ts(type = "string")]
    pub price: Money,

    #[serde(default, deserialize_with = "wire::optional_money")]
    #[ts(type = "string | null")]
    pub cost: Option<Money>,

    #[serde(default, deserialize_with = "wire::count")]
    pub stock: i64,

    #[serde(default, deserialize_with = "wire::count")]
    pub min_stock: i64,

    #[serde(default)]
    pub category_name: Option<String>,
}

/// The product form's working copy; same shape as the insert payload.
pub type ProductDraft = NewProduct;

impl NewProduct {
    /// Minimal payload: name and price, everything else defaulted.
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        NewProduct {
            name: name.into(),
            barcode: None,
            description: None,
            price,
            cost: None,
            stock: 0,
            min_stock: 0,
            category_name: None,
        }
    }

    /// Normalizes optional text and checks every field rule.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::{Money, NewProduct};
    ///
    /// let mut input = NewProduct::new("  Café 500g ", Money::from_cents(899));
    /// input.barcode = Some("".into());
    ///
    /// let valid = input.validate().unwrap();
    /// assert_eq!(valid.name, "Café 500g");
    /// assert_eq!(valid.barcode, None);
    /// ```
    pub fn validate(mut self) -> ValidationResult<NewProduct> {
        self.name = self.name.trim().to_string();
        self.barcode = normalize_optional(self.barcode);
        self.description = normalize_optional(self.description);
        self.category_name = normalize_optional(self.category_name);

        check_fields(&Fields {
            name: &self.name,
            barcode: self.barcode.as_deref(),
            category_name: self.category_name.as_deref(),
            price: self.price,
            cost: self.cost,
            stock: self.stock,
            min_stock: self.min_stock,
        })?;

        Ok(self)
    }

    /// Fills the barcode field from a capture session.
    ///
    /// Decoders sometimes append a carriage return; the text is trimmed and
    /// checked against the barcode rule before it replaces the current value.
    pub fn apply_scanned_barcode(&mut self, text: &str) -> ValidationResult<()> {
        let code = text.trim();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "barcode".to_string(),
            });
        }
        validate_barcode(code)?;
        self.barcode = Some(code.to_string());
        Ok(())
    }
}

// =============================================================================
// Product Patch
// =============================================================================

/// Partial update. Every field is optional.
///
/// Nullable columns use `Option<Option<T>>`:
/// - key absent → `None` (keep current value)
/// - key `null` → `Some(None)` (clear)
/// - key with value → `Some(Some(v))` (set)
///
/// Unknown keys (including `id` and `createdAt`) are ignored, so a client
/// echoing a full record back cannot change either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "wire::patch_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub barcode: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "wire::patch_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,

    #[serde(
        default,
        deserialize_with = "wire::patch_money",
        skip_serializing_if = "Option::is_none"
    )]
    pub cost: Option<Option<Money>>,

    #[serde(
        default,
        deserialize_with = "wire::patch_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub stock: Option<i64>,

    #[serde(
        default,
        deserialize_with = "wire::patch_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_stock: Option<i64>,

    #[serde(
        default,
        deserialize_with = "wire::patch_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_name: Option<Option<String>>,
}

impl ProductPatch {
    /// Patch that only changes the price.
    pub fn price(price: Money) -> Self {
        ProductPatch {
            price: Some(price),
            ..Default::default()
        }
    }

    /// True when the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

// =============================================================================
// User
// =============================================================================

/// An account record.
///
/// The password is stored exactly as given and never serialized outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// UUID v4.
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Payload for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl NewUser {
    /// Both fields are required; the username is trimmed.
    pub fn validate(mut self) -> ValidationResult<NewUser> {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() {
            return Err(ValidationError::Required {
                field: "username".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".to_string(),
            });
        }
        Ok(self)
    }
}

// =============================================================================
// Shared field rules
// =============================================================================

struct Fields<'a> {
    name: &'a str,
    barcode: Option<&'a str>,
    category_name: Option<&'a str>,
    price: Money,
    cost: Option<Money>,
    stock: i64,
    min_stock: i64,
}

fn check_fields(f: &Fields<'_>) -> ValidationResult<()> {
    validate_product_name(f.name)?;
    if let Some(barcode) = f.barcode {
        validate_barcode(barcode)?;
    }
    if let Some(category) = f.category_name {
        validate_category(category)?;
    }
    validate_amount("price", f.price)?;
    if let Some(cost) = f.cost {
        validate_amount("cost", cost)?;
    }
    validate_count("stock", f.stock)?;
    validate_count("minStock", f.min_stock)?;
    Ok(())
}

// =============================================================================
// Wire coercion helpers
// =============================================================================

mod wire {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;
    use std::fmt;

    use crate::money::Money;

    /// Integer, or a string holding one (HTML number inputs post strings).
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        d.deserialize_any(CountVisitor)
    }

    pub fn patch_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        count(d).map(Some)
    }

    /// `null` and `""` both mean "no cost".
    pub fn optional_money<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Money>, D::Error> {
        match Option::<MoneyOrBlank>::deserialize(d)? {
            None | Some(MoneyOrBlank::Blank) => Ok(None),
            Some(MoneyOrBlank::Amount(m)) => Ok(Some(m)),
        }
    }

    pub fn patch_money<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Option<Money>>, D::Error> {
        optional_money(d).map(Some)
    }

    /// Present key → `Some(..)`, with `null` becoming `Some(None)`.
    pub fn patch_text<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Option<String>>, D::Error> {
        Option::<String>::deserialize(d).map(Some)
    }

    enum MoneyOrBlank {
        Blank,
        Amount(Money),
    }

    impl<'de> Deserialize<'de> for MoneyOrBlank {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            struct BlankVisitor;

            impl<'de> Visitor<'de> for BlankVisitor {
                type Value = MoneyOrBlank;

                fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str("a decimal amount or an empty string")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<MoneyOrBlank, E> {
                    if v.trim().is_empty() {
                        return Ok(MoneyOrBlank::Blank);
                    }
                    v.parse().map(MoneyOrBlank::Amount).map_err(E::custom)
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<MoneyOrBlank, E> {
                    Money::deserialize(de::value::I64Deserializer::<E>::new(v))
                        .map(MoneyOrBlank::Amount)
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<MoneyOrBlank, E> {
                    Money::deserialize(de::value::U64Deserializer::<E>::new(v))
                        .map(MoneyOrBlank::Amount)
                }

                fn visit_f64<E: de::Error>(self, v: f64) -> Result<MoneyOrBlank, E> {
                    Money::deserialize(de::value::F64Deserializer::<E>::new(v))
                        .map(MoneyOrBlank::Amount)
                }
            }

            d.deserialize_any(BlankVisitor)
        }
    }

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom("number too large"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if v.fract() == 0.0 && v.is_finite() && v.abs() < 9.0e15 {
                Ok(v as i64)
            } else {
                Err(E::custom("expected a whole number"))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(0);
            }
            v.parse().map_err(|_| E::custom("expected a whole number"))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored() -> Product {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        Product {
            id: 7,
            name: "Yogur Natural".into(),
            barcode: Some("7501055300075".into()),
            description: None,
            price: Money::from_cents(1250),
            cost: Some(Money::from_cents(800)),
            stock: 12,
            min_stock: 4,
            category_name: Some("Lácteos".into()),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_new_product_defaults_from_json() {
        let input: NewProduct =
            serde_json::from_str(r#"{"name": "Pan", "price": "1.50"}"#).unwrap();

        assert_eq!(input.stock, 0);
        assert_eq!(input.min_stock, 0);
        assert_eq!(input.cost, None);
        assert_eq!(input.price.cents(), 150);
    }

    #[test]
    fn test_new_product_form_coercion() {
        let input: NewProduct = serde_json::from_str(
            r#"{"name": "Pan", "price": 2.5, "cost": "", "stock": "10", "minStock": 3,
                "barcode": "", "categoryName": "  Panadería "}"#,
        )
        .unwrap();
        let valid = input.validate().unwrap();

        assert_eq!(valid.price.cents(), 250);
        assert_eq!(valid.cost, None);
        assert_eq!(valid.stock, 10);
        assert_eq!(valid.min_stock, 3);
        assert_eq!(valid.barcode, None);
        assert_eq!(valid.category_name.as_deref(), Some("Panadería"));
    }

    #[test]
    fn test_apply_scanned_barcode() {
        let mut draft = NewProduct::new("Agua 1L", Money::from_cents(90));
        draft.apply_scanned_barcode("0123456789128\r\n").unwrap();
        assert_eq!(draft.barcode.as_deref(), Some("0123456789128"));

        assert!(draft.apply_scanned_barcode("   ").is_err());
        assert_eq!(draft.barcode.as_deref(), Some("0123456789128"));
    }

    #[test]
    fn test_new_product_rejects_invalid() {
        assert!(NewProduct::new("", Money::from_cents(100)).validate().is_err());
        assert!(NewProduct::new("x", Money::from_cents(-1)).validate().is_err());

        let mut negative_stock = NewProduct::new("x", Money::zero());
        negative_stock.stock = -2;
        let err = negative_stock.validate().unwrap_err();
        assert_eq!(err.field(), "stock");

        assert!(serde_json::from_str::<NewProduct>(r#"{"name": "x"}"#).is_err());
        assert!(serde_json::from_str::<NewProduct>(r#"{"name": "x", "price": "1.234"}"#).is_err());
    }

    #[test]
    fn test_patch_tri_state() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"barcode": null, "price": "3.99"}"#).unwrap();
        assert_eq!(patch.barcode, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.price, Some(Money::from_cents(399)));

        let updated = stored().apply_patch(patch).unwrap();
        assert_eq!(updated.barcode, None);
        assert_eq!(updated.price.cents(), 399);
        assert_eq!(updated.category_name.as_deref(), Some("Lácteos"));
    }

    #[test]
    fn test_patch_ignores_identity_fields() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"id": 99, "createdAt": "2001-01-01T00:00:00Z"}"#).unwrap();
        assert!(patch.is_empty());

        let before = stored();
        let after = before.clone().apply_patch(patch).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_patch_validation_applies_to_merged_record() {
        let patch = ProductPatch {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(stored().apply_patch(patch).is_err());

        let patch = ProductPatch {
            min_stock: Some(-1),
            ..Default::default()
        };
        assert!(stored().apply_patch(patch).is_err());
    }

    #[test]
    fn test_product_json_shape() {
        let json = serde_json::to_value(stored()).unwrap();
        assert_eq!(json["price"], "12.50");
        assert_eq!(json["cost"], "8.00");
        assert_eq!(json["minStock"], 4);
        assert_eq!(json["categoryName"], "Lácteos");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(stored().stock_value().cents(), 15000);
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: "550e8400-e29b-41d4-a716-446655440000".into(),
            username: "ana".into(),
            password: "secret".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_new_user_validation() {
        let ok = NewUser {
            username: " ana ".into(),
            password: "pw".into(),
        };
        assert_eq!(ok.validate().unwrap().username, "ana");

        let missing = NewUser {
            username: "ana".into(),
            password: String::new(),
        };
        assert!(missing.validate().is_err());
    }
}
