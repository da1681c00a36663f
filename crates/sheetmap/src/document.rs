//! Document container facade
//!
//! Loads and saves a [`Workbook`] in either supported format, choosing the
//! format explicitly or from the file extension.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use sheetmap_core::Workbook;
use sheetmap_csv::{CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};
use sheetmap_xlsx::{XlsxReader, XlsxWriter};

use crate::error::{MapError, MapResult};

/// Supported document formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Office Open XML workbook
    #[default]
    Xlsx,
    /// Comma separated values, one sheet
    Csv,
}

impl DocumentFormat {
    /// Detect the format from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> MapResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(DocumentFormat::Xlsx),
            Some("csv") => Ok(DocumentFormat::Csv),
            _ => Err(MapError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Xlsx => f.write_str("xlsx"),
            DocumentFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Decode a workbook from a stream
///
/// Decoding failures of either format surface as
/// [`MapError::MalformedDocument`].
pub fn load<R: Read + Seek>(
    reader: R,
    format: DocumentFormat,
    csv: &CsvReadOptions,
) -> MapResult<Workbook> {
    match format {
        DocumentFormat::Xlsx => XlsxReader::read(reader).map_err(MapError::malformed),
        DocumentFormat::Csv => CsvReader::read(reader, csv).map_err(MapError::malformed),
    }
}

/// Decode a workbook from a file, detecting the format unless one is given
pub fn load_file<P: AsRef<Path>>(
    path: P,
    format: Option<DocumentFormat>,
    csv: &CsvReadOptions,
) -> MapResult<Workbook> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => DocumentFormat::from_path(path)?,
    };
    let file = File::open(path)?;
    tracing::debug!(path = %path.display(), %format, "loading document");
    load(file, format, csv)
}

/// Encode a workbook into a stream
///
/// Encoding and sink failures surface as [`MapError::Persist`].
pub fn save<W: Write + Seek>(
    workbook: &Workbook,
    writer: W,
    format: DocumentFormat,
    csv: &CsvWriteOptions,
) -> MapResult<()> {
    match format {
        DocumentFormat::Xlsx => XlsxWriter::write(workbook, writer).map_err(MapError::persist),
        DocumentFormat::Csv => CsvWriter::write(workbook, writer, csv).map_err(MapError::persist),
    }
}

/// Encode a workbook into a file, in the format of its extension
pub fn save_file<P: AsRef<Path>>(
    workbook: &Workbook,
    path: P,
    csv: &CsvWriteOptions,
) -> MapResult<()> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    save(workbook, &mut writer, format, csv)?;
    writer.flush().map_err(MapError::persist)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path("a.xlsx").unwrap(), DocumentFormat::Xlsx);
        assert_eq!(DocumentFormat::from_path("a.XLSM").unwrap(), DocumentFormat::Xlsx);
        assert_eq!(DocumentFormat::from_path("dir/a.csv").unwrap(), DocumentFormat::Csv);
        assert!(matches!(
            DocumentFormat::from_path("a.xls"),
            Err(MapError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_path("noext").is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = load(
            Cursor::new(b"not a zip".to_vec()),
            DocumentFormat::Xlsx,
            &CsvReadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::MalformedDocument(_)));
    }

    #[test]
    fn test_save_failure_is_a_persist_error() {
        let mut buf = Cursor::new(Vec::new());
        let err = save(
            &Workbook::empty(),
            &mut buf,
            DocumentFormat::Xlsx,
            &CsvWriteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::Persist(_)));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_csv_stream_roundtrip() {
        let mut wb = Workbook::new();
        wb.first_sheet_mut().unwrap().set_value_at(0, 0, "Name").unwrap();

        let mut buf = Cursor::new(Vec::new());
        save(&wb, &mut buf, DocumentFormat::Csv, &CsvWriteOptions::default()).unwrap();
        buf.set_position(0);
        let back = load(buf, DocumentFormat::Csv, &CsvReadOptions::default()).unwrap();
        assert_eq!(
            back.first_sheet().unwrap().get_value_at(0, 0).as_string(),
            Some("Name")
        );
    }
}
