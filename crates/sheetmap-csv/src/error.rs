//! CSV errors

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors reading or writing CSV text
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unbalanced quotes, invalid UTF-8 and the like
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Zero-based record number and its field count
    #[error("Record {row} has {columns} fields, more than a sheet can hold")]
    TooManyColumns { row: usize, columns: usize },

    /// A date cell could not be rendered with the configured format
    #[error("Invalid date format: {0:?}")]
    InvalidDateFormat(String),

    /// A record landed outside the grid bounds
    #[error("Grid error: {0}")]
    Core(#[from] sheetmap_core::Error),
}
