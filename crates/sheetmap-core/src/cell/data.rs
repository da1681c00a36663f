//! Per-cell data: a value plus its presentation mark

use super::CellValue;

/// Presentation mark carried by a cell
///
/// The only presentation the mapper needs is flagging cells whose value
/// could not be produced. Containers render [`CellMark::Error`] as they see
/// fit (the XLSX writer uses a solid red fill).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellMark {
    /// Plain cell
    #[default]
    Normal,
    /// Cell holds a placeholder for a value that failed to convert
    Error,
}

/// Complete data for a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Presentation mark
    pub mark: CellMark,
}

impl CellData {
    /// Create a new cell with a value and no mark
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            mark: CellMark::Normal,
        }
    }

    /// Create an empty cell
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the cell's value
    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        self.value = value.into();
    }

    /// Flag this cell as holding an error placeholder
    pub fn mark_as_error(&mut self) {
        self.mark = CellMark::Error;
    }

    /// Whether the cell is flagged as an error placeholder
    pub fn is_marked_error(&self) -> bool {
        self.mark == CellMark::Error
    }

    /// Check if this cell is effectively empty (no value and no mark)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.mark == CellMark::Normal
    }
}
