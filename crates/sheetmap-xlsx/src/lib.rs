//! # sheetmap-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetmap.
//!
//! Only cell values, the date number formats needed to recognise date
//! cells, and the error-cell fill are read or written.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
