//! # sheetmap
//!
//! Map typed records to and from spreadsheet rows.
//!
//! A document is a header row followed by data rows. A [`HeaderMap`] ties
//! each header text to a record field; the [`Mapper`] reads every data row
//! into a record, or writes every record into a row. A cell or field that
//! fails doesn't stop the batch: it is reported as a [`CellError`] or
//! [`FieldError`] next to the result.
//!
//! ## Features
//!
//! - XLSX and CSV documents
//! - Struct records through a static [`RecordDescriptor`], or untyped
//!   [`MapRecord`]s
//! - Integer fields accept spreadsheet float text (`"3.0"`, `"1.2E+3"`)
//! - Header texts derived from field names (`firstName` <-> `"First Name"`)
//! - Strict writes that persist nothing when a field fails
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use sheetmap::prelude::*;
//!
//! let map = HeaderMap::from_pairs([("name", "Name"), ("city", "City")]).unwrap();
//! let records: Vec<MapRecord> = vec![
//!     [("name", FieldValue::Text("Ann".into())), ("city", FieldValue::Text("Oslo".into()))]
//!         .into_iter()
//!         .collect(),
//! ];
//!
//! let mapper = Mapper::new();
//! let mut buf = Cursor::new(Vec::new());
//! let report = mapper
//!     .write_records(&map, &records, &mut buf, &WriteOptions::default())
//!     .unwrap();
//! assert!(report.committed);
//!
//! buf.set_position(0);
//! let parsed: Parsed<MapRecord> = mapper
//!     .read_records(&map, buf, &ReadOptions::default())
//!     .unwrap();
//! assert_eq!(parsed.records, records);
//! ```

pub mod coerce;
pub mod document;
pub mod error;
pub mod header;
pub mod mapper;
pub mod naming;
pub mod options;
pub mod prelude;
pub mod read;
pub mod record;
pub mod write;

pub use coerce::{
    normalize_whole_number, CoercionRegistry, CoercionRegistryBuilder, FieldValue, RawCellValue,
    ScalarKind, TargetType,
};
pub use document::DocumentFormat;
pub use error::{AccessError, CellError, CoerceError, FieldError, MapError, MapResult};
pub use header::{ColumnBinding, ColumnMeta, HeaderMap, HeaderPair};
pub use mapper::{Mapper, Parsed, WriteReport};
pub use naming::{camel_case_to_words, words_to_camel_case};
pub use options::{CommitPolicy, ReadOptions, WriteOptions};
pub use record::{FieldAccessor, FieldType, MapRecord, RecordDescriptor, StructRecord};

// Re-export container types
pub use sheetmap_csv::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use sheetmap_core::{CellAddress, CellValue, Row, Workbook, Worksheet};
