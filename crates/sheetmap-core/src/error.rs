//! Grid model errors

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from building or addressing the grid
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index and the largest allowed index
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index and the largest allowed index
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Date outside the range of spreadsheet serial numbers
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}
