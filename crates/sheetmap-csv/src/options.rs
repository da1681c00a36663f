//! CSV options

use sheetmap_core::DATE_TIME_FORMAT;

/// Options for reading CSV
///
/// The first record is never treated specially: it lands in row 0 like
/// any other, where the mapper expects its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Lines starting with this byte are skipped
    pub comment: Option<u8>,
    /// Name of the single sheet the records land in
    pub sheet_name: String,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            comment: None,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl CsvReadOptions {
    /// Tab-separated input
    pub fn tsv() -> Self {
        Self::default().delimiter(b'\t')
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn comment(mut self, comment: u8) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Options for writing CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub line_terminator: LineTerminator,
    /// chrono format for date cells
    pub date_format: String,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_terminator: LineTerminator::LF,
            date_format: DATE_TIME_FORMAT.to_string(),
        }
    }
}

impl CsvWriteOptions {
    /// Tab-separated output
    pub fn tsv() -> Self {
        Self::default().delimiter(b'\t')
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn line_terminator(mut self, line_terminator: LineTerminator) -> Self {
        self.line_terminator = line_terminator;
        self
    }

    pub fn date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }
}

/// Record terminator written after each row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineTerminator {
    #[default]
    LF,
    CRLF,
}

impl From<LineTerminator> for csv::Terminator {
    fn from(t: LineTerminator) -> Self {
        match t {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        }
    }
}
