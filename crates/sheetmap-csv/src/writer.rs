//! CSV writer

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvWriteOptions;
use sheetmap_core::{CellValue, Workbook, Worksheet};

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write the first sheet of a workbook to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        workbook: &Workbook,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file, options)
    }

    /// Write the first sheet of a workbook to a writer
    ///
    /// CSV holds a single table; other sheets are dropped with a warning.
    pub fn write<W: Write>(workbook: &Workbook, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        if workbook.sheet_count() > 1 {
            log::warn!(
                "CSV holds one sheet; {} other sheet(s) not written",
                workbook.sheet_count() - 1
            );
        }
        match workbook.first_sheet() {
            Some(sheet) => Self::write_worksheet(sheet, writer, options),
            None => Ok(()),
        }
    }

    /// Write a worksheet to a writer
    ///
    /// The rectangle from A1 to the bottom-right populated cell is written,
    /// so cells keep their positions. Error marks can't be represented and
    /// are dropped. An invalid date format fails before anything is written.
    pub fn write_worksheet<W: Write>(
        worksheet: &Worksheet,
        writer: W,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        check_date_format(&options.date_format)?;
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(options.line_terminator.into())
            .flexible(true)
            .from_writer(writer);

        if let Some(range) = worksheet.used_range() {
            for row in 0..=range.end.row {
                let record = (0..=range.end.col)
                    .map(|col| field_text(&worksheet.get_value_at(row, col), &options.date_format))
                    .collect::<CsvResult<Vec<String>>>()?;
                csv_writer.write_record(&record)?;
            }
        }

        csv_writer.flush().map_err(CsvError::Io)?;
        Ok(())
    }
}

fn check_date_format(date_format: &str) -> CsvResult<()> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(CsvError::InvalidDateFormat(date_format.to_string()));
    }
    Ok(())
}

fn field_text(value: &CellValue, date_format: &str) -> CsvResult<String> {
    match value {
        CellValue::DateTime(d) => {
            // Well-formed specifiers can still fail, e.g. `%z` on a naive date
            let mut text = String::new();
            write!(text, "{}", d.format(date_format))
                .map_err(|_| CsvError::InvalidDateFormat(date_format.to_string()))?;
            Ok(text)
        }
        CellValue::Boolean(b) => Ok(b.to_string()),
        CellValue::Formula {
            cached_value: Some(cached),
            ..
        } => field_text(cached, date_format),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_keeps_positions() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_value_at(0, 0, "Name").unwrap();
        ws.set_value_at(0, 1, "When").unwrap();
        ws.set_value_at(2, 0, "a,b").unwrap();
        let date = NaiveDate::from_ymd_opt(2020, 5, 17)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        ws.set_value_at(2, 1, date).unwrap();

        let mut out = Vec::new();
        CsvWriter::write_worksheet(&ws, &mut out, &CsvWriteOptions::default()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,When\n,\n\"a,b\",2020-05-17 08:00:00\n"
        );
    }

    #[test]
    fn test_write_tsv_with_custom_dates() {
        let mut ws = Worksheet::new("Sheet1");
        let date = NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ws.set_value_at(0, 0, date).unwrap();
        ws.set_value_at(0, 1, true).unwrap();

        let options = CsvWriteOptions::tsv()
            .date_format("%d/%m/%Y")
            .line_terminator(crate::LineTerminator::CRLF);
        let mut out = Vec::new();
        CsvWriter::write_worksheet(&ws, &mut out, &options).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "02/01/2021\ttrue\r\n");
    }

    #[test]
    fn test_invalid_date_format_is_rejected() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_value_at(0, 0, "Name").unwrap();

        let mut out = Vec::new();
        let options = CsvWriteOptions::default().date_format("%Q");
        let err = CsvWriter::write_worksheet(&ws, &mut out, &options).unwrap_err();
        assert!(matches!(err, CsvError::InvalidDateFormat(ref f) if f == "%Q"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unformattable_date_is_an_error() {
        let mut ws = Worksheet::new("Sheet1");
        let date = NaiveDate::from_ymd_opt(2021, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ws.set_value_at(0, 0, date).unwrap();

        let mut out = Vec::new();
        let options = CsvWriteOptions::default().date_format("%Y %z");
        let err = CsvWriter::write_worksheet(&ws, &mut out, &options).unwrap_err();
        assert!(matches!(err, CsvError::InvalidDateFormat(_)));
    }

    #[test]
    fn test_write_empty_workbook() {
        let mut out = Vec::new();
        CsvWriter::write(&Workbook::empty(), &mut out, &CsvWriteOptions::default()).unwrap();
        assert!(out.is_empty());
    }
}
