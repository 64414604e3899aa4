//! # Locale and Export Options
//!
//! Column headers, sheet name and date rendering depend on the export
//! locale. Spanish is the default; it is what the stores print on paper.
//!
//! ```text
//! ┌────────┬──────────────┬──────────────────────────┐
//! │ Locale │ Sheet        │ Date                     │
//! ├────────┼──────────────┼──────────────────────────┤
//! │ es     │ Productos    │ 19/10/2026, 14:05:09     │
//! │ en     │ Products     │ 10/19/2026, 14:05:09     │
//! └────────┴──────────────┴──────────────────────────┘
//! ```

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of columns in both layouts.
pub const COLUMN_COUNT: usize = 11;

const HEADERS_ES: [&str; COLUMN_COUNT] = [
    "ID",
    "Nombre",
    "Código de Barras",
    "Categoría",
    "Descripción",
    "Precio",
    "Costo",
    "Stock",
    "Stock Mínimo",
    "Fecha Creación",
    "Fecha Actualización",
];

const HEADERS_EN: [&str; COLUMN_COUNT] = [
    "ID",
    "Name",
    "Barcode",
    "Category",
    "Description",
    "Price",
    "Cost",
    "Stock",
    "Min Stock",
    "Created At",
    "Updated At",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Locale::Es => "Productos",
            Locale::En => "Products",
        }
    }

    pub fn headers(&self) -> &'static [&'static str; COLUMN_COUNT] {
        match self {
            Locale::Es => &HEADERS_ES,
            Locale::En => &HEADERS_EN,
        }
    }

    /// Comment lines opening a SQL export: title, date label, count label.
    pub(crate) fn sql_labels(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            Locale::Es => (
                "Exportación de productos del inventario",
                "Fecha",
                "Total de productos",
            ),
            Locale::En => ("Inventory product export", "Date", "Total products"),
        }
    }

    /// Renders a timestamp the way the locale writes dates, at `offset`.
    pub fn format_datetime(&self, at: DateTime<Utc>, offset: FixedOffset) -> String {
        let local = at.with_timezone(&offset);
        match self {
            Locale::Es => local.format("%d/%m/%Y, %H:%M:%S").to_string(),
            Locale::En => local.format("%m/%d/%Y, %H:%M:%S").to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "es-es" => Ok(Locale::Es),
            "en" | "en-us" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// How an export is rendered and named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub locale: Locale,

    /// Offset applied to every rendered timestamp, in minutes east of UTC.
    pub utc_offset_minutes: i32,

    /// File name stem before the date.
    pub file_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            locale: Locale::Es,
            utc_offset_minutes: 0,
            file_prefix: "inventario".to_string(),
        }
    }
}

impl ExportOptions {
    /// The configured offset. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn format_datetime(&self, at: DateTime<Utc>) -> String {
        self.locale.format_datetime(at, self.offset())
    }
}
