//! Prelude module - common imports for sheetmap users
//!
//! ```rust
//! use sheetmap::prelude::*;
//! ```

pub use crate::{
    // Errors
    AccessError,
    CellError,
    // Coercion
    CoercionRegistry,
    CommitPolicy,
    DocumentFormat,
    // Records
    FieldAccessor,
    FieldError,
    FieldValue,
    // Headers
    HeaderMap,
    MapError,
    MapRecord,
    MapResult,
    // Engine
    Mapper,
    Parsed,
    RawCellValue,
    ReadOptions,
    RecordDescriptor,
    StructRecord,
    WriteOptions,
    WriteReport,
};
