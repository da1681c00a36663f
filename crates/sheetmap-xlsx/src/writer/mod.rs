//! XLSX writer

use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::XlsxStyleTable;
use sheetmap_core::date::date_time_to_serial;
use sheetmap_core::{CellAddress, CellData, CellValue, Workbook, Worksheet, DATE_TIME_FORMAT};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const SPREADSHEET_CT: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml";

/// Writes a [`Workbook`] as an XLSX package
///
/// Every sheet becomes one part. Strings are stored inline, so there is no
/// shared string table to build.
pub struct XlsxWriter;

impl XlsxWriter {
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::NoWorksheets);
        }

        let styles = XlsxStyleTable;
        let sheet_count = workbook.sheet_count();
        let mut zip = zip::ZipWriter::new(writer);

        put_part(&mut zip, "[Content_Types].xml", &content_types_xml(sheet_count))?;
        put_part(&mut zip, "_rels/.rels", &root_rels_xml())?;
        put_part(&mut zip, "xl/workbook.xml", &workbook_xml(workbook))?;
        put_part(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels_xml(sheet_count))?;
        put_part(&mut zip, "xl/styles.xml", &styles.to_styles_xml())?;

        let date_1904 = workbook.settings().date_1904;
        for (i, sheet) in workbook.worksheets().enumerate() {
            let xml = sheet_xml(sheet, &styles, date_1904);
            put_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", i + 1), &xml)?;
        }

        zip.finish()?;
        log::debug!("Wrote XLSX package with {} sheet(s)", sheet_count);
        Ok(())
    }
}

fn put_part<W: Write + Seek>(zip: &mut zip::ZipWriter<W>, name: &str, xml: &str) -> XlsxResult<()> {
    zip.start_file(name, zip::write::SimpleFileOptions::default())?;
    zip.write_all(xml.as_bytes())?;
    Ok(())
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"{SPREADSHEET_CT}.sheet.main+xml\"/>\
         <Override PartName=\"/xl/styles.xml\" ContentType=\"{SPREADSHEET_CT}.styles+xml\"/>"
    );
    for n in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Override PartName=\"/xl/worksheets/sheet{n}.xml\" ContentType=\"{SPREADSHEET_CT}.worksheet+xml\"/>"
        );
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"{PKG_REL_NS}\">\
         <Relationship Id=\"rId1\" Type=\"{DOC_REL_NS}/officeDocument\" Target=\"xl/workbook.xml\"/>\
         </Relationships>"
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!("{XML_DECL}\n<workbook xmlns=\"{MAIN_NS}\" xmlns:r=\"{DOC_REL_NS}\">");
    if workbook.settings().date_1904 {
        xml.push_str("<workbookPr date1904=\"1\"/>");
    }
    xml.push_str("<sheets>");
    for (i, sheet) in workbook.worksheets().enumerate() {
        let n = i + 1;
        let _ = write!(
            xml,
            "<sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
            escape_xml(sheet.name())
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

/// Sheets take rId1..=rIdN; styles follow them
fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!("{XML_DECL}\n<Relationships xmlns=\"{PKG_REL_NS}\">");
    for n in 1..=sheet_count {
        let _ = write!(
            xml,
            "<Relationship Id=\"rId{n}\" Type=\"{DOC_REL_NS}/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
        );
    }
    let _ = write!(
        xml,
        "<Relationship Id=\"rId{}\" Type=\"{DOC_REL_NS}/styles\" Target=\"styles.xml\"/></Relationships>",
        sheet_count + 1
    );
    xml
}

fn sheet_xml(sheet: &Worksheet, styles: &XlsxStyleTable, date_1904: bool) -> String {
    let mut xml = format!("{XML_DECL}\n<worksheet xmlns=\"{MAIN_NS}\">");
    if let Some(range) = sheet.used_range() {
        let _ = write!(xml, "<dimension ref=\"{}:{}\"/>", range.start, range.end);
    }

    xml.push_str("<sheetData>");
    for row in sheet.iter_rows() {
        let r = row.index() + 1;
        if row.is_empty() {
            let _ = write!(xml, "<row r=\"{r}\"/>");
            continue;
        }
        let _ = write!(xml, "<row r=\"{r}\">");
        for (col, cell) in row.iter() {
            push_cell(&mut xml, CellAddress::new(row.index(), col), cell, styles, date_1904);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Append one `<c>` element; an unmarked empty cell writes nothing
///
/// A date before the epoch has no serial number and is written as text.
fn push_cell(
    xml: &mut String,
    addr: CellAddress,
    cell: &CellData,
    styles: &XlsxStyleTable,
    date_1904: bool,
) {
    let mut value = &cell.value;
    let date_text;
    let (kind, body) = match &cell.value {
        CellValue::Empty => ("", String::new()),
        CellValue::Number(n) => ("", format!("<v>{n}</v>")),
        CellValue::DateTime(d) => match date_time_to_serial(*d, date_1904) {
            Ok(serial) => ("", format!("<v>{serial}</v>")),
            Err(err) => {
                log::warn!("{}: {}, writing it as text", addr, err);
                date_text = CellValue::string(d.format(DATE_TIME_FORMAT).to_string());
                value = &date_text;
                (" t=\"inlineStr\"", inline_str(&value.to_string()))
            }
        },
        CellValue::Boolean(b) => (" t=\"b\"", format!("<v>{}</v>", u8::from(*b))),
        CellValue::Error(e) => (" t=\"e\"", format!("<v>{}</v>", escape_xml(e.as_str()))),
        CellValue::String(s) => (" t=\"inlineStr\"", inline_str(s.as_str())),
        CellValue::Formula { text, cached_value } => {
            let formula = escape_xml(text.strip_prefix('=').unwrap_or(text));
            match cached_value.as_deref() {
                Some(CellValue::Number(n)) => ("", format!("<f>{formula}</f><v>{n}</v>")),
                _ => ("", format!("<f>{formula}</f>")),
            }
        }
    };

    let xf_id = styles.xf_id_for(value, cell.mark);
    if body.is_empty() && xf_id == 0 {
        return;
    }
    let style = if xf_id == 0 {
        String::new()
    } else {
        format!(" s=\"{xf_id}\"")
    };
    if body.is_empty() {
        let _ = write!(xml, "<c r=\"{addr}\"{style}/>");
    } else {
        let _ = write!(xml, "<c r=\"{addr}\"{style}{kind}>{body}</c>");
    }
}

fn inline_str(text: &str) -> String {
    format!("<is><t xml:space=\"preserve\">{}</t></is>", escape_xml(text))
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // A literal `_xHHHH_` would be decoded on read; escape its underscore
            '_' if looks_like_excel_escape(&s[i..]) => escaped.push_str("_x005F_"),
            // XML 1.0 can't carry most control characters; Excel's escape form can
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {
                let _ = write!(escaped, "_x{:04X}_", c as u32);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

fn looks_like_excel_escape(s: &str) -> bool {
    match s.as_bytes() {
        [b'_', b'x', h1, h2, h3, h4, b'_', ..] => {
            [h1, h2, h3, h4].iter().all(|b| b.is_ascii_hexdigit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XlsxReader;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Read};

    fn part(buf: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(buf)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut xml = String::new();
        file.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_xml("bell\u{7}"), "bell_x0007_");
        assert_eq!(escape_xml("tab\there"), "tab\there");
    }

    #[test]
    fn test_escape_xml_protects_literal_escape_sequences() {
        assert_eq!(escape_xml("code_x0041_end"), "code_x005F_x0041_end");
        assert_eq!(escape_xml("_x00ff_"), "_x005F_x00ff_");
        assert_eq!(escape_xml("snake_case_x1"), "snake_case_x1");
        assert_eq!(escape_xml("_x12G4_"), "_x12G4_");
    }

    #[test]
    fn test_pre_epoch_date_is_written_as_text() {
        let old = chrono::NaiveDate::from_ymd_opt(1850, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut wb = Workbook::new();
        let ws = wb.first_sheet_mut().unwrap();
        ws.set_value_at(0, 0, old).unwrap();
        ws.set_value_at(0, 1, 7.0).unwrap();

        let mut buf = Vec::new();
        XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();

        let sheet_xml = part(&buf, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains(
            r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">1850-01-01 00:00:00</t></is></c>"#
        ));
        let read = XlsxReader::read(Cursor::new(&buf)).unwrap();
        let sheet = read.first_sheet().unwrap();
        assert_eq!(sheet.get_value_at(0, 0).as_string(), Some("1850-01-01 00:00:00"));
        assert_eq!(sheet.get_value_at(0, 1), CellValue::Number(7.0));
    }

    #[test]
    fn test_empty_workbook_is_rejected() {
        let mut buf = Vec::new();
        let result = XlsxWriter::write(&Workbook::empty(), Cursor::new(&mut buf));
        assert!(matches!(result, Err(XlsxError::NoWorksheets)));
    }

    #[test]
    fn test_error_marked_cells_get_error_style() {
        let mut wb = Workbook::new();
        let ws = wb.first_sheet_mut().unwrap();
        ws.set_value_at(0, 0, "Name").unwrap();
        ws.new_row(1).unwrap().new_cell(0).mark_as_error();

        let mut buf = Vec::new();
        XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();

        let sheet_xml = part(&buf, "xl/worksheets/sheet1.xml");
        assert!(sheet_xml.contains(r#"<c r="A2" s="1"/>"#));
        assert!(sheet_xml.contains(r#"<dimension ref="A1:A2"/>"#));
    }

    #[test]
    fn test_package_parts() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("R&D").unwrap();
        let mut buf = Vec::new();
        XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();

        let types = part(&buf, "[Content_Types].xml");
        assert!(types.contains("/xl/worksheets/sheet2.xml"));
        assert!(part(&buf, "xl/workbook.xml").contains(r#"<sheet name="R&amp;D" sheetId="2" r:id="rId2"/>"#));
        assert!(part(&buf, "xl/_rels/workbook.xml.rels").contains(r#"Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles""#));
        assert!(part(&buf, "xl/worksheets/sheet2.xml").contains("<sheetData></sheetData>"));
    }

    #[test]
    fn test_date_1904_flag_is_written() {
        let mut wb = Workbook::new();
        wb.settings_mut().date_1904 = true;
        wb.first_sheet_mut().unwrap().set_value_at(0, 0, 1.0).unwrap();

        let mut buf = Vec::new();
        XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();

        assert!(part(&buf, "xl/workbook.xml").contains("date1904=\"1\""));
        assert!(XlsxReader::read(Cursor::new(&buf)).unwrap().settings().date_1904);
    }
}
