//! # sheetmap-csv
//!
//! CSV reader and writer for sheetmap.
//!
//! CSV carries no cell types: every field is read back as text and the
//! mapper's coercion rules decide what it becomes.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
