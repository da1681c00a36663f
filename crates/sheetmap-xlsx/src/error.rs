//! XLSX errors

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors reading or writing an XLSX package
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a ZIP archive
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A ZIP archive without `[Content_Types].xml`
    #[error("Not a spreadsheet package: missing [Content_Types].xml")]
    NotSpreadsheetPackage,

    /// A part the workbook or its relationships point to is absent
    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Invalid cell reference '{reference}': {source}")]
    BadCellReference {
        reference: String,
        #[source]
        source: sheetmap_core::Error,
    },

    /// XLSX can't represent a workbook with no sheets
    #[error("A workbook needs at least one worksheet to be written")]
    NoWorksheets,

    #[error("Core error: {0}")]
    Core(#[from] sheetmap_core::Error),
}
