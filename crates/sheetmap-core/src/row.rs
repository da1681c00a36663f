//! Row type

use std::collections::BTreeMap;

use crate::cell::{CellData, CellValue};

/// A physical row of a worksheet
///
/// Cells are stored sparsely by 0-based column index. A row can exist
/// without any cells (e.g., `<row r="5"/>` in an XLSX part).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Row index (0-based)
    index: u32,
    cells: BTreeMap<u16, CellData>,
}

impl Row {
    /// Create a new row with no cells
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: BTreeMap::new(),
        }
    }

    /// Row index (0-based)
    pub fn index(&self) -> u32 {
        self.index
    }

    /// One past the last populated column index, 0 when the row has no cells
    pub fn last_column_index_exclusive(&self) -> u16 {
        self.cells
            .keys()
            .next_back()
            .map(|c| c.saturating_add(1))
            .unwrap_or(0)
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&CellData> {
        self.cells.get(&col)
    }

    /// Get a mutable cell by column index
    pub fn cell_mut(&mut self, col: u16) -> Option<&mut CellData> {
        self.cells.get_mut(&col)
    }

    /// Create the cell at `col` (or return the existing one)
    pub fn new_cell(&mut self, col: u16) -> &mut CellData {
        self.cells.entry(col).or_default()
    }

    /// Set a cell's value, keeping its mark
    pub fn set_value<V: Into<CellValue>>(&mut self, col: u16, value: V) {
        self.new_cell(col).set_value(value);
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells in row
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over `(column, cell)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter().map(|(c, d)| (*c, d))
    }
}
