//! Read and write options

use sheetmap_csv::{CsvReadOptions, CsvWriteOptions};

use crate::document::DocumentFormat;

/// When a finished write is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Persist even if some fields failed
    #[default]
    Always,
    /// Persist only if no field failed; otherwise nothing is written
    OnlyIfNoErrors,
}

impl CommitPolicy {
    /// Whether a write that collected `error_count` field errors is kept
    pub fn should_commit(&self, error_count: usize) -> bool {
        match self {
            CommitPolicy::Always => true,
            CommitPolicy::OnlyIfNoErrors => error_count == 0,
        }
    }
}

/// Options for reading records
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Document format; when `None` it comes from the file extension, and
    /// streams default to XLSX
    pub format: Option<DocumentFormat>,
    /// CSV dialect
    pub csv: CsvReadOptions,
}

impl ReadOptions {
    /// Read the given format
    pub fn with_format(format: DocumentFormat) -> Self {
        Self {
            format: Some(format),
            ..Default::default()
        }
    }
}

/// Options for writing records
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Cell text written in place of a field that could not be read;
    /// `None` leaves the cell blank
    pub placeholder: Option<String>,
    /// Commit policy
    pub commit: CommitPolicy,
    /// Output format for streams; paths use their extension
    pub format: DocumentFormat,
    /// CSV dialect
    pub csv: CsvWriteOptions,
}

impl WriteOptions {
    /// Set the placeholder text
    pub fn placeholder<S: Into<String>>(mut self, placeholder: S) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the commit policy
    pub fn commit(mut self, commit: CommitPolicy) -> Self {
        self.commit = commit;
        self
    }

    /// Set the stream format
    pub fn format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }
}
