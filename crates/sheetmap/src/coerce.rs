//! Type coercion between cell values and typed fields
//!
//! A cell is first reduced to a [`RawCellValue`], which is text, a date or
//! absent. The [`CoercionRegistry`] then decides whether that raw value can
//! become a given [`TargetType`] and produces the [`FieldValue`].
//!
//! Spreadsheet numbers are always stored as doubles, so text headed for an
//! integral type goes through [`normalize_whole_number`] first: `"3.0"` and
//! `"1.23457E+17"` are valid integers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use lazy_regex::regex_captures;
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sheetmap_core::{CellValue, DATE_TIME_FORMAT};

use crate::error::CoerceError;

/// Exponents beyond this are left alone rather than expanded digit by digit
const MAX_NORMALIZED_EXPONENT: i64 = 4096;

/// Family of a field's value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Boolean
    Bool,
    /// Arbitrary-precision integer
    BigInt,
    /// Arbitrary-precision decimal
    BigDecimal,
    /// 96-bit fixed-point decimal
    Decimal,
    /// Text
    Text,
    /// Date and time
    DateTime,
}

impl ScalarKind {
    /// Every kind, in registry order
    pub const ALL: [ScalarKind; 11] = [
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Bool,
        ScalarKind::BigInt,
        ScalarKind::BigDecimal,
        ScalarKind::Decimal,
        ScalarKind::Text,
        ScalarKind::DateTime,
    ];

    /// Whether text for this kind goes through whole-number normalization
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64 | ScalarKind::BigInt
        )
    }

    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::BigInt => "BigInt",
            ScalarKind::BigDecimal => "BigDecimal",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::Text => "String",
            ScalarKind::DateTime => "NaiveDateTime",
        }
    }
}

/// The type a field accepts: a kind plus whether it can hold null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetType {
    /// Value family
    pub kind: ScalarKind,
    /// `Option<_>` fields are nullable
    pub nullable: bool,
}

impl TargetType {
    /// A non-nullable target
    pub const fn required(kind: ScalarKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// A nullable target
    pub const fn optional(kind: ScalarKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Whether a null raw value can be assigned. Text accepts null too; the
    /// field is then left absent rather than set to an empty string.
    pub fn accepts_null(&self) -> bool {
        self.nullable || self.kind == ScalarKind::Text
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.kind.name())
        } else {
            f.write_str(self.kind.name())
        }
    }
}

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value
    Null,
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    Decimal(Decimal),
    Text(String),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The kind of a non-null value
    pub fn kind(&self) -> Option<ScalarKind> {
        Some(match self {
            FieldValue::Null => return None,
            FieldValue::I16(_) => ScalarKind::I16,
            FieldValue::I32(_) => ScalarKind::I32,
            FieldValue::I64(_) => ScalarKind::I64,
            FieldValue::F32(_) => ScalarKind::F32,
            FieldValue::F64(_) => ScalarKind::F64,
            FieldValue::Bool(_) => ScalarKind::Bool,
            FieldValue::BigInt(_) => ScalarKind::BigInt,
            FieldValue::BigDecimal(_) => ScalarKind::BigDecimal,
            FieldValue::Decimal(_) => ScalarKind::Decimal,
            FieldValue::Text(_) => ScalarKind::Text,
            FieldValue::DateTime(_) => ScalarKind::DateTime,
        })
    }

    /// Canonical text form, `None` for null
    ///
    /// Coercing this text back to the value's own kind yields the value
    /// again.
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            FieldValue::Null => return None,
            FieldValue::I16(v) => v.to_string(),
            FieldValue::I32(v) => v.to_string(),
            FieldValue::I64(v) => v.to_string(),
            FieldValue::F32(v) => v.to_string(),
            FieldValue::F64(v) => v.to_string(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::BigInt(v) => v.to_string(),
            FieldValue::BigDecimal(v) => v.to_string(),
            FieldValue::Decimal(v) => v.to_string(),
            FieldValue::Text(v) => v.clone(),
            FieldValue::DateTime(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        })
    }

    /// The value as written into a cell: dates stay dates, null is blank
    /// text, everything else is its text form
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            FieldValue::DateTime(d) => CellValue::DateTime(*d),
            other => CellValue::string(other.to_text().unwrap_or_default()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

/// The readable content of one cell
///
/// Formula and error cells read as absent. String cells are trimmed and
/// collapse to absent when nothing is left.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCellValue {
    /// Empty, blank, formula or error cell
    Absent,
    /// Boolean cell, as `"true"` / `"false"`
    BooleanText(String),
    /// Numeric cell, as the shortest decimal text of the double
    NumericText(String),
    /// Date cell
    Date(NaiveDateTime),
    /// String cell, trimmed and non-empty
    Text(String),
}

impl RawCellValue {
    /// Reduce a cell value to its raw readable form
    pub fn from_cell(value: &CellValue) -> Self {
        match value {
            CellValue::Empty | CellValue::Error(_) | CellValue::Formula { .. } => {
                RawCellValue::Absent
            }
            CellValue::Boolean(b) => RawCellValue::BooleanText(b.to_string()),
            CellValue::Number(n) => RawCellValue::NumericText(n.to_string()),
            CellValue::DateTime(d) => RawCellValue::Date(*d),
            CellValue::String(s) => match s.as_str().trim() {
                "" => RawCellValue::Absent,
                trimmed => RawCellValue::Text(trimmed.to_string()),
            },
        }
    }

    /// Build a text raw value the way a string cell would read
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        RawCellValue::from_cell(&CellValue::string(s.as_ref()))
    }

    /// Check if the value is absent
    pub fn is_absent(&self) -> bool {
        matches!(self, RawCellValue::Absent)
    }

    /// The text of a textual raw value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawCellValue::BooleanText(s) | RawCellValue::NumericText(s) | RawCellValue::Text(s) => {
                Some(s)
            }
            RawCellValue::Absent | RawCellValue::Date(_) => None,
        }
    }

    /// Diagnostic rendering, `None` when absent
    pub fn describe(&self) -> Option<String> {
        match self {
            RawCellValue::Absent => None,
            RawCellValue::Date(d) => Some(d.format(DATE_TIME_FORMAT).to_string()),
            other => other.as_text().map(str::to_string),
        }
    }

    /// The value stored into a key/value record: dates stay dates, text is
    /// kept verbatim
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            RawCellValue::Absent => FieldValue::Null,
            RawCellValue::Date(d) => FieldValue::DateTime(*d),
            other => FieldValue::Text(other.as_text().unwrap_or_default().to_string()),
        }
    }
}

/// Rewrite text holding a whole number in decimal or scientific form to its
/// plain integral form.
///
/// `"2.000000"` -> `"2"`, `"1.23457E+17"` -> `"123457000000000000"`. Text that
/// isn't a number, or has a non-zero fraction, is returned unchanged.
pub fn normalize_whole_number(text: &str) -> Cow<'_, str> {
    let Some((_, _, exponent)) =
        regex_captures!(r"^[+-]?(\d+\.?\d*|\.\d+)(?:[eE]([+-]?\d+))?$", text)
    else {
        return Cow::Borrowed(text);
    };

    if !exponent.is_empty() {
        match exponent.parse::<i64>() {
            Ok(e) if e.abs() <= MAX_NORMALIZED_EXPONENT => {}
            _ => return Cow::Borrowed(text),
        }
    }

    match BigDecimal::from_str(text) {
        Ok(decimal) if decimal.is_integer() => {
            let (digits, _) = decimal.with_scale(0).into_bigint_and_exponent();
            let plain = digits.to_string();
            if plain == text {
                Cow::Borrowed(text)
            } else {
                Cow::Owned(plain)
            }
        }
        _ => Cow::Borrowed(text),
    }
}

/// Parses trimmed, non-empty text into a value of one kind
pub type TextParser = fn(&str) -> Option<FieldValue>;

fn parse_i16(s: &str) -> Option<FieldValue> {
    s.parse().ok().map(FieldValue::I16)
}

fn parse_i32(s: &str) -> Option<FieldValue> {
    s.parse().ok().map(FieldValue::I32)
}

fn parse_i64(s: &str) -> Option<FieldValue> {
    s.parse().ok().map(FieldValue::I64)
}

fn parse_f32(s: &str) -> Option<FieldValue> {
    s.parse().ok().map(FieldValue::F32)
}

fn parse_f64(s: &str) -> Option<FieldValue> {
    s.parse().ok().map(FieldValue::F64)
}

/// Anything but a case-insensitive "true" is false; never fails
fn parse_bool(s: &str) -> Option<FieldValue> {
    Some(FieldValue::Bool(s.eq_ignore_ascii_case("true")))
}

fn parse_big_int(s: &str) -> Option<FieldValue> {
    BigInt::from_str(s).ok().map(FieldValue::BigInt)
}

fn parse_big_decimal(s: &str) -> Option<FieldValue> {
    BigDecimal::from_str(s).ok().map(FieldValue::BigDecimal)
}

fn parse_decimal(s: &str) -> Option<FieldValue> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .map(FieldValue::Decimal)
}

fn parse_text(s: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(s.to_string()))
}

fn parse_date_time(s: &str) -> Option<FieldValue> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(FieldValue::DateTime)
}

fn default_parser(kind: ScalarKind) -> TextParser {
    match kind {
        ScalarKind::I16 => parse_i16,
        ScalarKind::I32 => parse_i32,
        ScalarKind::I64 => parse_i64,
        ScalarKind::F32 => parse_f32,
        ScalarKind::F64 => parse_f64,
        ScalarKind::Bool => parse_bool,
        ScalarKind::BigInt => parse_big_int,
        ScalarKind::BigDecimal => parse_big_decimal,
        ScalarKind::Decimal => parse_decimal,
        ScalarKind::Text => parse_text,
        ScalarKind::DateTime => parse_date_time,
    }
}

static STANDARD: Lazy<CoercionRegistry> = Lazy::new(|| CoercionRegistry::builder().build());

/// Immutable table of text parsers, one per [`ScalarKind`]
///
/// Built once and shared by reference; [`CoercionRegistry::standard`] is the
/// process-wide default.
#[derive(Debug, Clone)]
pub struct CoercionRegistry {
    parsers: HashMap<ScalarKind, TextParser>,
}

impl CoercionRegistry {
    /// The standard registry
    pub fn standard() -> &'static CoercionRegistry {
        &STANDARD
    }

    /// Start from the standard parsers
    pub fn builder() -> CoercionRegistryBuilder {
        CoercionRegistryBuilder {
            parsers: ScalarKind::ALL
                .iter()
                .map(|kind| (*kind, default_parser(*kind)))
                .collect(),
        }
    }

    /// Whether `raw` can become a value of `target`
    pub fn can_coerce(&self, raw: &RawCellValue, target: TargetType) -> bool {
        self.coerce(raw, target).is_ok()
    }

    /// Convert `raw` into a value of `target`
    pub fn coerce(&self, raw: &RawCellValue, target: TargetType) -> Result<FieldValue, CoerceError> {
        let mismatch = || CoerceError::TypeMismatch {
            value: raw.describe().unwrap_or_else(|| "null".to_string()),
            target,
        };

        match raw {
            RawCellValue::Absent if target.accepts_null() => Ok(FieldValue::Null),
            RawCellValue::Absent => Err(mismatch()),
            RawCellValue::Date(d) if target.kind == ScalarKind::DateTime => {
                Ok(FieldValue::DateTime(*d))
            }
            RawCellValue::Date(_) => Err(mismatch()),
            text => {
                let text = text.as_text().ok_or_else(mismatch)?;
                self.coerce_text(text, target.kind).ok_or_else(mismatch)
            }
        }
    }

    /// Parse text as `kind`, normalizing whole numbers for integral kinds
    pub fn coerce_text(&self, text: &str, kind: ScalarKind) -> Option<FieldValue> {
        let parser = self.parsers.get(&kind).copied().unwrap_or(default_parser(kind));
        if kind.is_integral() {
            parser(&normalize_whole_number(text))
        } else {
            parser(text)
        }
    }
}

impl Default for CoercionRegistry {
    fn default() -> Self {
        CoercionRegistry::builder().build()
    }
}

/// Builder for a [`CoercionRegistry`] with replaced parsers
#[derive(Debug, Clone)]
pub struct CoercionRegistryBuilder {
    parsers: HashMap<ScalarKind, TextParser>,
}

impl CoercionRegistryBuilder {
    /// Replace the text parser of one kind
    pub fn parser(mut self, kind: ScalarKind, parser: TextParser) -> Self {
        self.parsers.insert(kind, parser);
        self
    }

    /// Freeze the table
    pub fn build(self) -> CoercionRegistry {
        CoercionRegistry {
            parsers: self.parsers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn coerce(raw: &str, target: TargetType) -> Result<FieldValue, CoerceError> {
        CoercionRegistry::standard().coerce(&RawCellValue::text(raw), target)
    }

    fn req(kind: ScalarKind) -> TargetType {
        TargetType::required(kind)
    }

    #[test]
    fn test_normalize_whole_number() {
        assert_eq!(normalize_whole_number("2.000000"), "2");
        assert_eq!(normalize_whole_number("2.01"), "2.01");
        assert_eq!(normalize_whole_number("1.23457E+17"), "123457000000000000");
        assert_eq!(normalize_whole_number("-3.0"), "-3");
        assert_eq!(normalize_whole_number("abc"), "abc");
        assert_eq!(normalize_whole_number("1e99999999"), "1e99999999");
        assert!(matches!(normalize_whole_number("42"), Cow::Borrowed("42")));
    }

    #[test]
    fn test_integral_targets_accept_float_text() {
        assert_eq!(coerce("3.0", req(ScalarKind::I32)), Ok(FieldValue::I32(3)));
        assert_eq!(coerce("3", req(ScalarKind::I16)), Ok(FieldValue::I16(3)));
        assert_eq!(
            coerce("1.23457E+17", req(ScalarKind::I64)),
            Ok(FieldValue::I64(123_457_000_000_000_000))
        );
        assert_eq!(
            coerce("1.5E+30", req(ScalarKind::BigInt)),
            Ok(FieldValue::BigInt(
                BigInt::from_str("1500000000000000000000000000000").unwrap()
            ))
        );
        assert!(coerce("3.5", req(ScalarKind::I32)).is_err());
        assert!(coerce("70000", req(ScalarKind::I16)).is_err());
        assert!(coerce("abc", req(ScalarKind::I64)).is_err());
    }

    #[test]
    fn test_float_and_decimal_targets() {
        assert_eq!(coerce("2.5", req(ScalarKind::F64)), Ok(FieldValue::F64(2.5)));
        assert_eq!(coerce("2.5", req(ScalarKind::F32)), Ok(FieldValue::F32(2.5)));
        assert_eq!(
            coerce("1.0", req(ScalarKind::BigDecimal)),
            Ok(FieldValue::BigDecimal(BigDecimal::from_str("1.0").unwrap()))
        );
        assert_eq!(
            coerce("1.5e3", req(ScalarKind::Decimal)),
            Ok(FieldValue::Decimal(Decimal::from(1500)))
        );
        assert!(coerce("x1", req(ScalarKind::F64)).is_err());
    }

    #[test]
    fn test_bool_is_lenient() {
        assert_eq!(coerce("TRUE", req(ScalarKind::Bool)), Ok(FieldValue::Bool(true)));
        assert_eq!(coerce("true", req(ScalarKind::Bool)), Ok(FieldValue::Bool(true)));
        assert_eq!(coerce("yes", req(ScalarKind::Bool)), Ok(FieldValue::Bool(false)));
        assert_eq!(coerce("garbage", req(ScalarKind::Bool)), Ok(FieldValue::Bool(false)));
    }

    #[test]
    fn test_null_handling() {
        let registry = CoercionRegistry::standard();
        let absent = RawCellValue::Absent;

        assert!(registry.coerce(&absent, req(ScalarKind::I32)).is_err());
        assert!(registry.coerce(&absent, req(ScalarKind::Bool)).is_err());
        assert_eq!(
            registry.coerce(&absent, TargetType::optional(ScalarKind::I32)),
            Ok(FieldValue::Null)
        );
        assert_eq!(
            registry.coerce(&absent, req(ScalarKind::Text)),
            Ok(FieldValue::Null)
        );
        for kind in ScalarKind::ALL {
            assert!(registry.can_coerce(&absent, TargetType::optional(kind)));
        }
    }

    #[test]
    fn test_dates() {
        let d = NaiveDate::from_ymd_opt(2020, 2, 29)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let registry = CoercionRegistry::standard();

        assert_eq!(
            registry.coerce(&RawCellValue::Date(d), req(ScalarKind::DateTime)),
            Ok(FieldValue::DateTime(d))
        );
        assert!(registry
            .coerce(&RawCellValue::Date(d), req(ScalarKind::Text))
            .is_err());
        assert_eq!(
            coerce("2020-02-29 10:00:00", req(ScalarKind::DateTime)),
            Ok(FieldValue::DateTime(d))
        );
        assert_eq!(
            coerce("2020-02-29T10:00:00", req(ScalarKind::DateTime)),
            Ok(FieldValue::DateTime(d))
        );
        assert!(coerce("2020-02-29", req(ScalarKind::DateTime)).is_ok());
        assert!(coerce("29/02/2020", req(ScalarKind::DateTime)).is_err());
    }

    #[test]
    fn test_raw_cell_value_from_cell() {
        assert_eq!(RawCellValue::from_cell(&CellValue::Number(3.0)), RawCellValue::NumericText("3".into()));
        assert_eq!(RawCellValue::from_cell(&CellValue::Boolean(true)), RawCellValue::BooleanText("true".into()));
        assert_eq!(RawCellValue::from_cell(&CellValue::string("  a b  ")), RawCellValue::Text("a b".into()));
        assert!(RawCellValue::from_cell(&CellValue::string("   ")).is_absent());
        assert!(RawCellValue::from_cell(&CellValue::formula("=1+1")).is_absent());
        assert!(RawCellValue::from_cell(&CellValue::Error(sheetmap_core::ErrorValue::Na)).is_absent());
    }

    #[test]
    fn test_custom_parser() {
        fn yes_no(s: &str) -> Option<FieldValue> {
            match s.to_ascii_lowercase().as_str() {
                "yes" => Some(FieldValue::Bool(true)),
                "no" => Some(FieldValue::Bool(false)),
                _ => None,
            }
        }

        let registry = CoercionRegistry::builder()
            .parser(ScalarKind::Bool, yes_no)
            .build();
        let target = req(ScalarKind::Bool);

        assert_eq!(registry.coerce(&RawCellValue::text("Yes"), target), Ok(FieldValue::Bool(true)));
        assert!(registry.coerce(&RawCellValue::text("maybe"), target).is_err());
    }

    #[test]
    fn test_cell_value_of_field_values() {
        assert_eq!(FieldValue::Null.to_cell_value(), CellValue::string(""));
        assert_eq!(FieldValue::I32(7).to_cell_value(), CellValue::string("7"));
        assert_eq!(FieldValue::F64(0.1).to_cell_value(), CellValue::string("0.1"));
        assert_eq!(FieldValue::Bool(false).to_cell_value(), CellValue::string("false"));
    }

    proptest! {
        #[test]
        fn integral_decimals_normalize(n in any::<i64>(), zeros in 1usize..8) {
            let text = format!("{}.{}", n, "0".repeat(zeros));
            prop_assert_eq!(normalize_whole_number(&text).into_owned(), n.to_string());
        }

        #[test]
        fn i64_coercion_is_idempotent(n in any::<i64>()) {
            let target = TargetType::required(ScalarKind::I64);
            let first = coerce(&n.to_string(), target).unwrap();
            let again = coerce(&first.to_text().unwrap(), target).unwrap();
            prop_assert_eq!(again, first);
        }

        #[test]
        fn f64_coercion_is_idempotent(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let target = TargetType::required(ScalarKind::F64);
            let first = coerce(&x.to_string(), target).unwrap();
            let again = coerce(&first.to_text().unwrap(), target).unwrap();
            prop_assert_eq!(again, first);
        }

        #[test]
        fn text_coercion_is_idempotent(s in "[a-zA-Z0-9 .,-]{1,20}", kind in proptest::sample::select(ScalarKind::ALL.to_vec())) {
            let target = TargetType::optional(kind);
            let raw = RawCellValue::text(&s);
            if let Ok(first) = CoercionRegistry::standard().coerce(&raw, target) {
                let canonical = RawCellValue::text(first.to_text().unwrap_or_default());
                let again = CoercionRegistry::standard().coerce(&canonical, target).unwrap();
                prop_assert_eq!(again.to_text(), first.to_text());
            }
        }
    }
}
