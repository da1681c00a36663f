//! Cell values

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

/// Text form used when a date cell has to be rendered as text
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a cell holds
///
/// Dates are a value kind of their own: the XLSX reader turns a number
/// with a date number format into `DateTime`, and the writer turns it back.
/// Formulas are kept with their cached result but never evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Boolean(bool),
    Number(f64),
    String(SharedString),
    DateTime(NaiveDateTime),
    Error(ErrorValue),
    Formula {
        /// Formula text without the leading `=` when read from XLSX
        text: String,
        cached_value: Option<Box<CellValue>>,
    },
}

impl CellValue {
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(SharedString::new(s.into()))
    }

    /// Formula with no cached result
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula {
            text: text.into(),
            cached_value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s.as_str()),
            CellValue::DateTime(d) => write!(f, "{}", d.format(DATE_TIME_FORMAT)),
            CellValue::Error(e) => f.write_str(e.as_str()),
            CellValue::Formula {
                cached_value: Some(v),
                ..
            } => fmt::Display::fmt(v, f),
            CellValue::Formula { text, .. } => f.write_str(text),
        }
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for CellValue {
            fn from(n: $t) -> Self {
                CellValue::Number(f64::from(n))
            }
        })*
    };
}

number_from!(i16, i32, u16, u32, f32, f64);

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(d: NaiveDateTime) -> Self {
        CellValue::DateTime(d)
    }
}

impl From<ErrorValue> for CellValue {
    fn from(e: ErrorValue) -> Self {
        CellValue::Error(e)
    }
}

/// Error literal stored in a cell (`t="e"` in XLSX)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorValue {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    Na,
}

impl ErrorValue {
    const LITERALS: [(ErrorValue, &'static str); 7] = [
        (ErrorValue::Null, "#NULL!"),
        (ErrorValue::Div0, "#DIV/0!"),
        (ErrorValue::Value, "#VALUE!"),
        (ErrorValue::Ref, "#REF!"),
        (ErrorValue::Name, "#NAME?"),
        (ErrorValue::Num, "#NUM!"),
        (ErrorValue::Na, "#N/A"),
    ];

    pub fn as_str(&self) -> &'static str {
        Self::LITERALS
            .iter()
            .find(|(e, _)| e == self)
            .map_or("#N/A", |(_, s)| *s)
    }

    /// Case-insensitive lookup of an error literal
    pub fn parse(s: &str) -> Option<Self> {
        Self::LITERALS
            .iter()
            .find(|(_, lit)| lit.eq_ignore_ascii_case(s))
            .map(|(e, _)| *e)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable, cheaply cloned cell text
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}
