//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellData`] - Complete cell data including value and mark

mod address;
mod data;
mod value;

pub use address::CellAddress;
pub use data::{CellData, CellMark};
pub use value::{CellValue, ErrorValue, SharedString, DATE_TIME_FORMAT};
