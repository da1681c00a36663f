//! CSV write -> read roundtrips

use pretty_assertions::assert_eq;
use sheetmap_core::Workbook;
use sheetmap_csv::{CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, LineTerminator};

#[test]
fn test_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");

    let mut wb = Workbook::new();
    let ws = wb.first_sheet_mut().unwrap();
    ws.set_value_at(0, 0, "First Name").unwrap();
    ws.set_value_at(0, 1, "Note").unwrap();
    ws.set_value_at(1, 0, "Ada").unwrap();
    ws.set_value_at(1, 1, "line one\nline two").unwrap();
    ws.set_value_at(2, 0, "Grace").unwrap();

    let options = CsvWriteOptions {
        line_terminator: LineTerminator::CRLF,
        ..CsvWriteOptions::default()
    };
    CsvWriter::write_file(&wb, &path, &options).unwrap();
    let wb2 = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
    let ws2 = wb2.first_sheet().unwrap();

    assert_eq!(ws2.last_row_index(), Some(2));
    assert_eq!(ws2.get_value_at(0, 0).as_string(), Some("First Name"));
    assert_eq!(ws2.get_value_at(1, 1).as_string(), Some("line one\nline two"));
    assert_eq!(ws2.get_value_at(2, 0).as_string(), Some("Grace"));
    assert!(ws2.cell_at(2, 1).is_none());
}
