//! # stockroom-export: Catalog Export
//!
//! Turns a product collection into a downloadable file.
//!
//! ## Formats
//! ```text
//! ┌──────────┬────────────────────────────┬──────────────────────────────────┐
//! │ Format   │ File                       │ Content                          │
//! ├──────────┼────────────────────────────┼──────────────────────────────────┤
//! │ Xlsx     │ inventario_2026-10-19.xlsx │ one sheet, header + product rows │
//! │ Sql      │ inventario_2026-10-19.sql  │ comment header + INSERTs         │
//! └──────────┴────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! The caller decides which products are exported: the full catalog, or
//! whatever a [`stockroom_core::ProductFilter`] left visible.

pub mod error;
pub mod locale;
pub mod spreadsheet;
pub mod sql;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::Product;
use tracing::info;

pub use error::{ExportError, ExportResult};
pub use locale::{ExportOptions, Locale};

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Sql,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Sql => "sql",
        }
    }

    /// MIME type for an HTTP download.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Sql => "application/sql; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "sql" => Ok(ExportFormat::Sql),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// `<prefix>_<YYYY-MM-DD>.<ext>`, dated in UTC.
pub fn file_name(options: &ExportOptions, now: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        options.file_prefix,
        now.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Renders `products` in `format`.
pub fn render(
    format: ExportFormat,
    products: &[&Product],
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> ExportResult<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Xlsx => spreadsheet::to_xlsx(products, options)?,
        ExportFormat::Sql => sql::to_sql(products, options, now).into_bytes(),
    };

    info!(
        format = %format,
        products = products.len(),
        bytes = bytes.len(),
        "Export rendered"
    );

    Ok(bytes)
}

/// Renders and writes to `path`.
pub fn write_to(
    path: &Path,
    format: ExportFormat,
    products: &[&Product],
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> ExportResult<()> {
    let bytes = render(format, products, options, now)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_names() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();
        let options = ExportOptions::default();

        assert_eq!(
            file_name(&options, now, ExportFormat::Xlsx),
            "inventario_2026-10-19.xlsx"
        );
        assert_eq!(
            file_name(&options, now, ExportFormat::Sql),
            "inventario_2026-10-19.sql"
        );
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("sql".parse::<ExportFormat>().unwrap(), ExportFormat::Sql);
        assert!("csv".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_render_sql_is_utf8_text() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let bytes = render(ExportFormat::Sql, &[], &ExportOptions::default(), now).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("-- Exportación"));
    }

    #[test]
    fn test_write_to_missing_directory_is_io_error() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let path = std::env::temp_dir()
            .join("stockroom-export-missing-dir")
            .join("nested")
            .join("out.sql");

        let err = write_to(&path, ExportFormat::Sql, &[], &ExportOptions::default(), now)
            .unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
