//! Error types for the mapping engine
//!
//! Two families live here. [`MapError`] aborts a whole operation and is
//! returned to the caller. [`CellError`] and [`FieldError`] describe a single
//! failed datum; they are returned alongside the records or the write report
//! and never abort row or record processing. [`AccessError`] and [`CoerceError`] are the
//! causes they carry.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::coerce::TargetType;

/// Result type alias using [`MapError`]
pub type MapResult<T> = std::result::Result<T, MapError>;

/// Errors that abort a whole read, write or append
#[derive(Debug, Error)]
pub enum MapError {
    /// The header map is empty or has a blank header text or field name
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// The source could not be decoded as a document
    #[error("Malformed document: {0}")]
    MalformedDocument(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The document could not be encoded into the sink
    #[error("Failed to save document: {0}")]
    Persist(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The document has no sheet
    #[error("The document has no sheet")]
    EmptyDocument,

    /// None of the header cells matched the header map
    #[error("None of the header cells in the first row matches the header map")]
    InvalidHeaderRow,

    /// The document to append to does not exist
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The document format could not be determined
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Grid model error
    #[error("Core error: {0}")]
    Core(#[from] sheetmap_core::Error),
}

impl MapError {
    /// Whether this is a structural document error, as opposed to a
    /// configuration or IO failure
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MapError::MalformedDocument(_)
                | MapError::EmptyDocument
                | MapError::InvalidHeaderRow
                | MapError::DocumentNotFound(_)
        )
    }

    pub(crate) fn malformed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MapError::MalformedDocument(Box::new(err))
    }

    pub(crate) fn persist<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MapError::Persist(Box::new(err))
    }
}

/// A raw value could not be converted to a target type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    /// The value has no representation in the target type
    #[error("Cannot convert {value} to {target}")]
    TypeMismatch {
        /// The raw value, rendered for diagnostics (`null` when absent)
        value: String,
        /// The requested type
        target: TargetType,
    },
}

/// Failure to read or write a named field on a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// The record exposes no readable field of that name
    #[error("No readable field \"{0}\"")]
    NoSuchField(String),

    /// None of the setters for the field accepts the raw value
    #[error("No suitable setter for field \"{field}\" with cell value \"{}\"", .value.as_deref().unwrap_or("null"))]
    NoSuitableSetter {
        /// Field name
        field: String,
        /// Raw value attempted, `None` when the cell was absent
        value: Option<String>,
    },

    /// The value could not be coerced
    #[error(transparent)]
    TypeMismatch(#[from] CoerceError),

    /// A getter or setter reported a failure of its own
    #[error("Accessor for field \"{field}\" failed: {message}")]
    Invocation {
        /// Field name
        field: String,
        /// Message returned by the accessor
        message: String,
    },
}

/// A cell that could not be read into its field
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    /// Data row index (0-based, the row after the header is 0)
    pub row_index: usize,
    /// Physical column index (0-based)
    pub column_index: usize,
    /// Field the column maps to
    pub field_name: String,
    /// Header text of the column
    pub header_text: String,
    /// What went wrong
    pub cause: AccessError,
}

impl CellError {
    /// Data row index counted from 1
    pub fn row_index_one_based(&self) -> usize {
        self.row_index + 1
    }

    /// Column index counted from 1
    pub fn column_index_one_based(&self) -> usize {
        self.column_index + 1
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rowIndex = {}, columnIndex = {}, field = \"{}\", header = \"{}\": {}",
            self.row_index, self.column_index, self.field_name, self.header_text, self.cause
        )
    }
}

impl std::error::Error for CellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// A field that could not be read out of a record for writing
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Position of the record in the input sequence (0-based)
    pub record_index: usize,
    /// Field that failed
    pub field_name: String,
    /// What went wrong
    pub cause: AccessError,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recordIndex = {}, field = \"{}\": {}",
            self.record_index, self.field_name, self.cause
        )
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
