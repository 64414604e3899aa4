//! # SQL Export
//!
//! Writes the collection as INSERT statements that load into the
//! `inventory_products` table of another installation.
//!
//! ```text
//! -- Exportación de productos del inventario
//! -- Fecha: 19/10/2026, 14:05:09
//! -- Total de productos: 2
//!
//! INSERT INTO inventory_products (name, barcode, ...) ⏎
//! VALUES ('Café 500g', '7501055300075', NULL, 8.99, NULL, 12, 3, 'Bebidas');
//!
//! INSERT INTO inventory_products ...
//! ```
//!
//! Ids and timestamps are not exported; the receiving store assigns its own.

use chrono::{DateTime, Utc};

use stockroom_core::Product;

use crate::locale::ExportOptions;

const INSERT_PREFIX: &str = "INSERT INTO inventory_products \
     (name, barcode, description, price, cost, stock, min_stock, category_name) ";

/// Single-quotes a string literal, doubling embedded quotes.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn quote_optional(text: Option<&str>) -> String {
    text.map(quote).unwrap_or_else(|| "NULL".to_string())
}

/// One INSERT statement for `product`, split over two lines.
pub fn insert_statement(product: &Product) -> String {
    let cost = product
        .cost
        .map(|c| c.to_string())
        .unwrap_or_else(|| "NULL".to_string());

    format!(
        "{INSERT_PREFIX}\nVALUES ({}, {}, {}, {}, {}, {}, {}, {});",
        quote(&product.name),
        quote_optional(product.barcode.as_deref()),
        quote_optional(product.description.as_deref()),
        product.price,
        cost,
        product.stock,
        product.min_stock,
        quote_optional(product.category_name.as_deref()),
    )
}

/// Full script: header comments, then one statement per product.
pub fn to_sql(products: &[&Product], options: &ExportOptions, now: DateTime<Utc>) -> String {
    let (title, date_label, total_label) = options.locale.sql_labels();

    let statements: Vec<String> = products.iter().map(|p| insert_statement(p)).collect();

    format!(
        "-- {title}\n-- {date_label}: {}\n-- {total_label}: {}\n\n{}",
        options.format_datetime(now),
        products.len(),
        statements.join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use chrono::TimeZone;
    use stockroom_core::Money;

    fn product(id: i64, name: &str) -> Product {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        Product {
            id,
            name: name.to_string(),
            barcode: None,
            description: None,
            price: Money::from_cents(899),
            cost: None,
            stock: 12,
            min_stock: 3,
            category_name: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'Brien's"), "'O''Brien''s'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_insert_with_nulls() {
        let p = product(1, "Café 500g");
        assert_eq!(
            insert_statement(&p),
            "INSERT INTO inventory_products (name, barcode, description, price, cost, stock, min_stock, category_name) \n\
             VALUES ('Café 500g', NULL, NULL, 8.99, NULL, 12, 3, NULL);"
        );
    }

    #[test]
    fn test_insert_with_all_fields() {
        let mut p = product(1, "Leche");
        p.barcode = Some("7501055300075".into());
        p.description = Some("Entera, 1L".into());
        p.cost = Some(Money::from_cents(500));
        p.category_name = Some("Lácteos".into());

        let sql = insert_statement(&p);
        assert!(sql.ends_with(
            "VALUES ('Leche', '7501055300075', 'Entera, 1L', 8.99, 5.00, 12, 3, 'Lácteos');"
        ));
    }

    #[test]
    fn test_script_layout() {
        let a = product(1, "A");
        let b = product(2, "B");
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap();

        let script = to_sql(&[&a, &b], &ExportOptions::default(), now);
        let mut lines = script.lines();
        assert_eq!(lines.next(), Some("-- Exportación de productos del inventario"));
        assert_eq!(lines.next(), Some("-- Fecha: 19/10/2026, 14:05:09"));
        assert_eq!(lines.next(), Some("-- Total de productos: 2"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(script.matches("INSERT INTO").count(), 2);
        assert!(script.contains(";\n\nINSERT INTO"));
    }

    #[test]
    fn test_empty_collection_and_english_header() {
        let options = ExportOptions {
            locale: Locale::En,
            ..ExportOptions::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap();

        let script = to_sql(&[], &options, now);
        assert_eq!(
            script,
            "-- Inventory product export\n-- Date: 10/19/2026, 14:05:09\n-- Total products: 0\n\n"
        );
    }
}
