//! Header text <-> field name association
//!
//! A [`HeaderMap`] is written through in declared order (one column per
//! pair) and read through by looking up the header text found in the first
//! row. [`ColumnMeta`] is that lookup resolved against one concrete header
//! row.

use std::collections::BTreeMap;

use ahash::AHashMap;
use sheetmap_core::Row;

use crate::coerce::RawCellValue;
use crate::error::{MapError, MapResult};
use crate::naming::{camel_case_to_words, words_to_camel_case};
use crate::record::FieldAccessor;

/// One column: the record field and its header text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderPair {
    /// Field name
    pub field: String,
    /// Header text
    pub header: String,
}

/// Ordered association between field names and header texts
///
/// Never empty, and neither side of a pair is blank.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<HeaderPair>", into = "Vec<HeaderPair>")
)]
pub struct HeaderMap {
    pairs: Vec<HeaderPair>,
    by_header: AHashMap<String, usize>,
}

impl HeaderMap {
    /// Build from `(field, header)` pairs in column order
    ///
    /// A field listed twice keeps its first position and takes the last
    /// header.
    pub fn from_pairs<I, F, H>(pairs: I) -> MapResult<Self>
    where
        I: IntoIterator<Item = (F, H)>,
        F: Into<String>,
        H: Into<String>,
    {
        let mut collected: Vec<HeaderPair> = Vec::new();
        for (index, (field, header)) in pairs.into_iter().enumerate() {
            let (field, header) = (field.into(), header.into());
            if field.trim().is_empty() {
                return Err(MapError::InvalidMapping(format!(
                    "One header has a blank field name. Header Index (0-based) = {}",
                    index
                )));
            }
            if header.trim().is_empty() {
                return Err(MapError::InvalidMapping(format!(
                    "One header has a blank header text. Header Index (0-based) = {}",
                    index
                )));
            }
            match collected.iter_mut().find(|p| p.field == field) {
                Some(existing) => existing.header = header,
                None => collected.push(HeaderPair { field, header }),
            }
        }
        Self::from_validated(collected)
    }

    /// Build from `(header, field)` pairs, the orientation used for reading
    ///
    /// A header listed twice keeps its first position and takes the last
    /// field.
    pub fn from_reverse_pairs<I, H, F>(pairs: I) -> MapResult<Self>
    where
        I: IntoIterator<Item = (H, F)>,
        H: Into<String>,
        F: Into<String>,
    {
        let mut collected: Vec<HeaderPair> = Vec::new();
        for (index, (header, field)) in pairs.into_iter().enumerate() {
            let (header, field) = (header.into(), field.into());
            if header.trim().is_empty() {
                return Err(MapError::InvalidMapping(format!(
                    "One header defined in the reverse header map has a blank header text. Header Index (0-based) = {}",
                    index
                )));
            }
            if field.trim().is_empty() {
                return Err(MapError::InvalidMapping(format!(
                    "One header defined in the reverse header map has a blank field name. Header Index (0-based) = {}",
                    index
                )));
            }
            match collected.iter_mut().find(|p| p.header == header) {
                Some(existing) => existing.field = field,
                None => collected.push(HeaderPair { field, header }),
            }
        }
        Self::from_validated(collected)
    }

    /// Derive header texts from field names: `firstName` -> `"First Name"`
    pub fn from_field_names<I, S>(fields: I) -> MapResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_pairs(fields.into_iter().map(|f| {
            let field = f.as_ref().to_string();
            let header = camel_case_to_words(&field);
            (field, header)
        }))
    }

    /// Derive field names from header texts: `"First Name"` -> `firstName`
    pub fn from_header_texts<I, S>(headers: I) -> MapResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_reverse_pairs(headers.into_iter().map(|h| {
            let header = h.as_ref().to_string();
            let field = words_to_camel_case(&header);
            (header, field)
        }))
    }

    /// Derive field names from the non-blank cells of a header row
    pub fn from_header_row(row: &Row) -> MapResult<Self> {
        let texts: Vec<String> = row
            .iter()
            .filter_map(|(_, cell)| RawCellValue::from_cell(&cell.value).describe())
            .collect();
        Self::from_header_texts(texts)
    }

    /// Columns for writing `R`: its gettable fields, in declared order
    pub fn for_writing<R: FieldAccessor>() -> MapResult<Self> {
        Self::from_field_names(R::gettable_fields())
    }

    /// Columns for reading `R`: its settable fields, in declared order
    pub fn for_reading<R: FieldAccessor>() -> MapResult<Self> {
        Self::from_field_names(R::settable_fields())
    }

    fn from_validated(pairs: Vec<HeaderPair>) -> MapResult<Self> {
        if pairs.is_empty() {
            return Err(MapError::InvalidMapping(
                "the header map can not be empty".to_string(),
            ));
        }
        let by_header = pairs
            .iter()
            .enumerate()
            .map(|(i, p)| (p.header.clone(), i))
            .collect();
        Ok(Self { pairs, by_header })
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if the map has no columns
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in column order
    pub fn pairs(&self) -> &[HeaderPair] {
        &self.pairs
    }

    /// Iterate `(field, header)` in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|p| (p.field.as_str(), p.header.as_str()))
    }

    /// Field mapped to a header text
    pub fn field_for_header(&self, header: &str) -> Option<&str> {
        self.by_header
            .get(header)
            .map(|&i| self.pairs[i].field.as_str())
    }

    /// Header text of a field
    pub fn header_for_field(&self, field: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.field == field)
            .map(|p| p.header.as_str())
    }
}

impl PartialEq for HeaderMap {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl TryFrom<Vec<HeaderPair>> for HeaderMap {
    type Error = MapError;

    fn try_from(pairs: Vec<HeaderPair>) -> MapResult<Self> {
        Self::from_pairs(pairs.into_iter().map(|p| (p.field, p.header)))
    }
}

impl From<HeaderMap> for Vec<HeaderPair> {
    fn from(map: HeaderMap) -> Self {
        map.pairs
    }
}

/// A recognized column of the header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    /// Field the column maps to
    pub field: String,
    /// Header text found in the cell
    pub header: String,
}

/// Physical column index -> field, resolved from one header row
///
/// Columns whose header text isn't in the map are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMeta {
    columns: BTreeMap<u16, ColumnBinding>,
}

impl ColumnMeta {
    /// Resolve the cells of `header_row` against `map`
    pub fn resolve(header_row: &Row, map: &HeaderMap) -> Self {
        let columns = header_row
            .iter()
            .filter_map(|(col, cell)| {
                let text = RawCellValue::from_cell(&cell.value).describe()?;
                let field = map.field_for_header(&text)?;
                Some((
                    col,
                    ColumnBinding {
                        field: field.to_string(),
                        header: text,
                    },
                ))
            })
            .collect();
        Self { columns }
    }

    /// Binding of a column
    pub fn get(&self, column: u16) -> Option<&ColumnBinding> {
        self.columns.get(&column)
    }

    /// Number of recognized columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no column was recognized
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over recognized columns in column order
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ColumnBinding)> {
        self.columns.iter().map(|(c, b)| (*c, b))
    }
}
