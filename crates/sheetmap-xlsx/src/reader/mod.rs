//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, CellFormats};
use sheetmap_core::date::serial_to_date_time;
use sheetmap_core::{CellAddress, CellValue, ErrorValue, SharedString, Workbook, Worksheet};

/// Undo the `_xHHHH_` escapes Excel writes for characters XML can't hold
///
/// `_x005f_` is an escaped underscore, so `_x005f_x0041_` stays literal text.
/// Malformed sequences are kept as they are.
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        // _xHHHH_ is exactly 7 bytes
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()))
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Sheet entry from workbook.xml
struct SheetInfo {
    name: String,
    r_id: String,
}

/// Cell state collected between `<c>` and `</c>`
#[derive(Default)]
struct PendingCell {
    reference: Option<String>,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    formula: Option<String>,
}

/// Shared lookup tables used while decoding cells
struct CellContext<'a> {
    shared_strings: &'a [String],
    formats: &'a CellFormats,
    date_1904: bool,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    ///
    /// A package that declares no worksheets yields an empty workbook;
    /// deciding whether that is an error is left to the caller.
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::NotSpreadsheetPackage);
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let formats = Self::read_styles(&mut archive)?;
        let (sheet_info, date_1904) = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = date_1904;

        let ctx = CellContext {
            shared_strings: &shared_strings,
            formats: &formats,
            date_1904,
        };

        for info in &sheet_info {
            let Some(path) = sheet_paths.get(&info.r_id) else {
                log::warn!(
                    "Sheet '{}' has no worksheet relationship {}; skipped",
                    info.name,
                    info.r_id
                );
                continue;
            };

            let mut worksheet = Worksheet::new(info.name.clone());
            Self::read_worksheet(&mut archive, path, &mut worksheet, &ctx)?;
            log::debug!(
                "Read sheet '{}' from {} ({} rows)",
                info.name,
                path,
                worksheet.row_count()
            );
            workbook.add_existing_worksheet(worksheet)?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        log::debug!("Read {} shared strings", strings.len());
        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<CellFormats> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(CellFormats::default()),
        }
    }

    /// Read workbook.xml to get sheet names, rIds and the date system
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetInfo>, bool)> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut date_1904 = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"sheet" => {
                        if let (Some(name), Some(r_id)) =
                            (attr_value(&e, b"name"), attr_value(&e, b"r:id"))
                        {
                            sheets.push(SheetInfo { name, r_id });
                        }
                    }
                    b"workbookPr" => {
                        date_1904 = attr_value(&e, b"date1904")
                            .map(|v| is_truthy(&v))
                            .unwrap_or(false);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date_1904))
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet part into `worksheet`
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        ctx: &CellContext<'_>,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => Self::declare_row(worksheet, &e)?,
                    b"c" => {
                        cell = Some(PendingCell {
                            reference: attr_value(&e, b"r"),
                            cell_type: attr_value(&e, b"t"),
                            style: attr_value(&e, b"s").and_then(|s| s.parse().ok()),
                            ..PendingCell::default()
                        });
                    }
                    b"v" if cell.is_some() => in_value = true,
                    b"f" if cell.is_some() => in_formula = true,
                    b"is" if cell.is_some() => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    // <row/> with no cells still exists; <c/> has no value
                    if e.name().as_ref() == b"row" {
                        Self::declare_row(worksheet, &e)?;
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            Self::process_cell(worksheet, pending, ctx)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"is" => in_inline_str = false,
                    b"t" if in_inline_str => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(pending) = cell.as_mut() {
                        if in_value || in_formula || in_inline_text {
                            let text = e.unescape().map_err(XlsxError::Xml)?;
                            if in_value {
                                pending.value.get_or_insert_with(String::new).push_str(&text);
                            } else if in_formula {
                                pending
                                    .formula
                                    .get_or_insert_with(String::new)
                                    .push_str(&text);
                            } else {
                                pending.value.get_or_insert_with(String::new).push_str(&text);
                                pending.cell_type = Some("inlineStr".to_string());
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn declare_row(worksheet: &mut Worksheet, e: &BytesStart<'_>) -> XlsxResult<()> {
        let row_num = attr_value(e, b"r").and_then(|s| s.parse::<u32>().ok());
        match row_num {
            Some(r) if r > 0 => {
                worksheet.new_row(r - 1)?;
            }
            _ => log::warn!("Row element without a valid 'r' attribute in sheet '{}'", worksheet.name()),
        }
        Ok(())
    }

    /// Decode one cell and store it in the worksheet
    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        ctx: &CellContext<'_>,
    ) -> XlsxResult<()> {
        let Some(reference) = cell.reference.as_deref() else {
            log::warn!("Cell without a reference in sheet '{}'; skipped", worksheet.name());
            return Ok(());
        };
        let addr = CellAddress::parse(reference).map_err(|source| XlsxError::BadCellReference {
            reference: reference.to_string(),
            source,
        })?;

        let cell_type = cell.cell_type.as_deref();
        let is_date = cell.style.map(|s| ctx.formats.is_date(s)).unwrap_or(false);

        let decoded = match (cell.formula, cell.value) {
            (Some(f), value) => {
                let cached = value.and_then(|v| Self::decode_value(&v, cell_type, is_date, ctx));
                let text = if f.starts_with('=') { f } else { format!("={}", f) };
                Some(CellValue::Formula {
                    text,
                    cached_value: cached.map(Box::new),
                })
            }
            (None, Some(value)) => Self::decode_value(&value, cell_type, is_date, ctx),
            (None, None) => None,
        };

        if let Some(value) = decoded {
            worksheet.set_value_at(addr.row, addr.col, value)?;
        } else {
            // Value-less cells keep their row alive
            worksheet.new_row(addr.row)?;
        }

        Ok(())
    }

    fn decode_value(
        value: &str,
        cell_type: Option<&str>,
        is_date: bool,
        ctx: &CellContext<'_>,
    ) -> Option<CellValue> {
        let decoded = match cell_type {
            // Shared string
            Some("s") => {
                let Some(s) = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| ctx.shared_strings.get(idx))
                else {
                    log::warn!("Invalid shared string index '{}'", value);
                    return None;
                };
                CellValue::String(SharedString::new(s))
            }

            Some("b") => CellValue::Boolean(is_truthy(value.trim())),

            Some("e") => match ErrorValue::parse(value.trim()) {
                Some(e) => CellValue::Error(e),
                None => CellValue::string(value),
            },

            Some("inlineStr") | Some("str") => CellValue::string(decode_excel_escapes(value)),

            // ISO 8601 date cell (t="d")
            Some("d") => match chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            {
                Ok(d) => CellValue::DateTime(d),
                Err(_) => CellValue::string(value),
            },

            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) if is_date => match serial_to_date_time(n, ctx.date_1904) {
                    Some(d) => CellValue::DateTime(d),
                    None => CellValue::Number(n),
                },
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(value),
            },

            Some(other) => {
                log::warn!("Unknown cell type '{}'; reading value as text", other);
                CellValue::string(value)
            }
        };
        Some(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;

    const WORKBOOK_RELS: &[u8] = br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    /// Build a minimal package; `parts` are (name, content) pairs added after
    /// the content types part.
    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(CONTENT_TYPES).unwrap();
            for (name, content) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    fn single_sheet(sheet_xml: &[u8], extra: &[(&str, &[u8])]) -> Vec<u8> {
        let mut parts: Vec<(&str, &[u8])> = vec![
            ("xl/workbook.xml", br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", sheet_xml),
        ];
        parts.extend_from_slice(extra);
        package(&parts)
    }

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("line1_x000d__x000a_line2"), "line1\r\nline2");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
        assert_eq!(decode_excel_escapes("_x000D_"), "\r");
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        // Incomplete sequences are left as-is
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("a_xzzzz_b"), "a_xzzzz_b");
    }

    #[test]
    fn test_workbook_without_sheets_is_empty() {
        let buf = package(&[
            ("xl/workbook.xml", br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets/></workbook>"#),
            ("xl/_rels/workbook.xml.rels", br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#),
        ]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();
        assert_eq!(workbook.sheet_count(), 0);
    }

    #[test]
    fn test_missing_content_types_is_invalid() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }

        let result = XlsxReader::read(Cursor::new(buf));
        assert!(matches!(result, Err(XlsxError::NotSpreadsheetPackage)));
    }

    #[test]
    fn test_not_a_zip() {
        let result = XlsxReader::read(Cursor::new(b"Name,Age\n".to_vec()));
        assert!(matches!(result, Err(XlsxError::Zip(_))));
    }

    #[test]
    fn test_cell_types() {
        let sheet = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Inline</t></is></c></row>
            <row r="2"><c r="A2"><v>3.5</v></c><c r="B2" t="b"><v>1</v></c><c r="C2" t="e"><v>#N/A</v></c><c r="D2"><f>A2*2</f><v>7</v></c></row>
            <row r="4"/>
        </sheetData></worksheet>"#;
        let strings = br#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>Name</t></si><si><r><t>Rich </t></r><r><t>text</t></r></si></sst>"#;
        let buf = single_sheet(sheet, &[("xl/sharedStrings.xml", strings)]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();
        let ws = workbook.first_sheet().unwrap();

        assert_eq!(ws.name(), "Data");
        assert_eq!(ws.get_value_at(0, 0).as_string(), Some("Name"));
        assert_eq!(ws.get_value_at(0, 1).as_string(), Some("Rich text"));
        assert_eq!(ws.get_value_at(0, 2).as_string(), Some("Inline"));
        assert_eq!(ws.get_value_at(1, 0), CellValue::Number(3.5));
        assert_eq!(ws.get_value_at(1, 1), CellValue::Boolean(true));
        assert_eq!(ws.get_value_at(1, 2), CellValue::Error(ErrorValue::Na));
        assert!(ws.get_value_at(1, 3).is_formula());

        assert_eq!(ws.last_row_index(), Some(3));
        assert!(ws.row(3).unwrap().is_empty());
        assert!(ws.row(2).is_none());
    }

    #[test]
    fn test_date_cells_from_styles() {
        let sheet = br#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
            <row r="1"><c r="A1" s="1"><v>45292.5</v></c><c r="B1" s="0"><v>45292.5</v></c></row>
        </sheetData></worksheet>"#;
        let styles = br#"<?xml version="1.0"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;
        let buf = single_sheet(sheet, &[("xl/styles.xml", styles)]);

        let workbook = XlsxReader::read(Cursor::new(buf)).unwrap();
        let ws = workbook.first_sheet().unwrap();

        let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(ws.get_value_at(0, 0), CellValue::DateTime(expected));
        assert_eq!(ws.get_value_at(0, 1), CellValue::Number(45292.5));
    }
}
