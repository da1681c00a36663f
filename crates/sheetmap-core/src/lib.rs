//! # sheetmap-core
//!
//! Grid model used by the sheetmap record mapper.
//!
//! This crate provides the document container types the mapping engine drives:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, dates, errors, formulas)
//! - [`CellData`] and [`CellMark`] - A cell's value plus its presentation mark
//! - [`CellAddress`] - A1-style cell addressing
//! - [`Row`], [`Worksheet`], [`Workbook`] - The document structures
//! - [`NumberFormat`] - Date detection for numeric cells
//!
//! ## Example
//!
//! ```rust
//! use sheetmap_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.first_sheet_mut().unwrap();
//!
//! sheet.set_value_at(0, 0, "Name").unwrap();
//! sheet.set_value_at(1, 0, CellValue::string("Alice")).unwrap();
//!
//! assert_eq!(sheet.last_row_index(), Some(1));
//! ```

pub mod cell;
pub mod date;
pub mod error;
pub mod number_format;
pub mod row;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    CellAddress, CellData, CellMark, CellValue, ErrorValue, SharedString, DATE_TIME_FORMAT,
};
pub use error::{Error, Result};
pub use number_format::NumberFormat;
pub use row::Row;
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::{UsedRange, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
