//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use sheetmap_core::{CellValue, Workbook, Worksheet, MAX_COLS};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a single-sheet workbook
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a single-sheet workbook
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Workbook> {
        let worksheet = Self::read_worksheet(reader, options)?;
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(worksheet)?;
        Ok(workbook)
    }

    /// Read CSV from a reader into a worksheet
    ///
    /// Every record becomes a physical row, even one whose fields are all
    /// empty. Empty fields produce no cell.
    pub fn read_worksheet<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .comment(options.comment)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut worksheet = Worksheet::new(&options.sheet_name);

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            if record.len() > MAX_COLS as usize {
                return Err(CsvError::TooManyColumns {
                    row: row_idx,
                    columns: record.len(),
                });
            }

            let row_idx = row_idx as u32;
            worksheet.new_row(row_idx)?;
            for (col, field) in record.iter().enumerate() {
                if field.is_empty() {
                    continue;
                }
                worksheet.set_value_at(row_idx, col as u16, CellValue::string(field))?;
            }
        }

        log::debug!("Read {} CSV records", worksheet.row_count());
        Ok(worksheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fields_are_text() {
        let data = "Name,Age,Active\nAlice,30,true\n";
        let wb = CsvReader::read(data.as_bytes(), &CsvReadOptions::default()).unwrap();
        let ws = wb.first_sheet().unwrap();

        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(ws.get_value_at(0, 0).as_string(), Some("Name"));
        assert_eq!(ws.get_value_at(1, 1).as_string(), Some("30"));
        assert_eq!(ws.get_value_at(1, 2).as_string(), Some("true"));
    }

    #[test]
    fn test_empty_fields_and_ragged_records() {
        let data = "a,b,c\n1,,3\n,\nx\n";
        let ws = CsvReader::read_worksheet(data.as_bytes(), &CsvReadOptions::default()).unwrap();

        assert!(ws.cell_at(1, 1).is_none());
        assert_eq!(ws.get_value_at(1, 2).as_string(), Some("3"));
        assert!(ws.row(2).unwrap().is_empty());
        assert_eq!(ws.get_value_at(3, 0).as_string(), Some("x"));
        assert_eq!(ws.last_row_index(), Some(3));
    }

    #[test]
    fn test_custom_delimiter() {
        let options = CsvReadOptions {
            delimiter: b';',
            ..CsvReadOptions::default()
        };
        let ws = CsvReader::read_worksheet("a;\"b;c\"\n".as_bytes(), &options).unwrap();
        assert_eq!(ws.get_value_at(0, 1).as_string(), Some("b;c"));
    }

    #[test]
    fn test_tsv_with_comments_and_sheet_name() {
        let options = CsvReadOptions {
            sheet_name: "People".to_string(),
            ..CsvReadOptions::tsv().comment(b'#')
        };
        let wb = CsvReader::read("# export\nName\tAge\nAnn\t31\n".as_bytes(), &options).unwrap();
        let ws = wb.first_sheet().unwrap();

        assert_eq!(ws.name(), "People");
        assert_eq!(ws.get_value_at(0, 1).as_string(), Some("Age"));
        assert_eq!(ws.get_value_at(1, 1).as_string(), Some("31"));
    }
}
