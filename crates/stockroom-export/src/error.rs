//! Export errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The xlsx writer failed.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
