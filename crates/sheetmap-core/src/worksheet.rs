//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellValue};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::{MAX_COLS, MAX_ROWS};

/// Bounding box of the populated cells of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedRange {
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner (inclusive)
    pub end: CellAddress,
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Row index → row
    rows: BTreeMap<u32, Row>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Row Access ===

    /// Index of the last physical row, `None` when the sheet has no rows
    pub fn last_row_index(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Get a row by index
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Get a mutable row by index
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    /// Create the row at `index` (or return the existing one)
    pub fn new_row(&mut self, index: u32) -> Result<&mut Row> {
        if index >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(index, MAX_ROWS - 1));
        }
        Ok(self.rows.entry(index).or_insert_with(|| Row::new(index)))
    }

    /// Number of physical rows (including rows with no cells)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate over rows in index order
    pub fn iter_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    // === Cell Access ===

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Get a mutable cell by row and column indices
    pub fn cell_at_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.cell_mut(col))
    }

    /// Get cell value by address string (e.g., "A1")
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cell_at(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Set a cell value by row and column indices
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        self.new_row(row)?.set_value(col, value);
        Ok(())
    }

    /// Iterate over all cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(r, row)| row.iter().map(move |(c, cell)| (*r, c, cell)))
    }

    /// Bounding box of all populated cells
    pub fn used_range(&self) -> Option<UsedRange> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for (row, col, _) in self.iter_cells() {
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| UsedRange {
            start: CellAddress::new(r0, c0),
            end: CellAddress::new(r1, c1),
        })
    }
}
