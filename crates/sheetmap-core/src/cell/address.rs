//! A1-style cell addresses

use std::fmt;
use std::str::FromStr;

use lazy_regex::regex_captures;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Zero-based position of a cell in a sheet
///
/// Parsed from and displayed as the 1-based A1 form used in XLSX `r`
/// attributes and `<dimension ref>`. Absolute markers (`$B$2`) parse to the
/// same position as `B2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an A1 reference
    ///
    /// ```
    /// use sheetmap_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B3").unwrap();
    /// assert_eq!((addr.row, addr.col), (2, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (_, letters, digits) = regex_captures!(r"^\$?([A-Za-z]{1,3})\$?([0-9]{1,7})$", s.trim())
            .ok_or_else(|| Error::InvalidAddress(format!("'{}' is not an A1 reference", s)))?;

        let col = Self::letters_to_column(letters)?;
        let row = digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| Error::InvalidAddress(format!("row number must be >= 1 in '{}'", s)))?;
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self { row, col })
    }

    /// Column letters for a zero-based index: 0 is `A`, 26 is `AA`
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::with_capacity(3);
        let mut n = u32::from(col) + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.iter().rev().map(|&b| char::from(b)).collect()
    }

    /// Zero-based index of column letters, case-insensitive
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::InvalidAddress(format!(
                "invalid column letters '{}'",
                letters
            )));
        }

        let col = letters.bytes().try_fold(0u32, |acc, b| {
            let next = acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
            (next <= u32::from(MAX_COLS)).then_some(next)
        });
        match col {
            Some(n) => Ok((n - 1) as u16),
            None => Err(Error::ColumnOutOfBounds(MAX_COLS, MAX_COLS - 1)),
        }
    }

    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
