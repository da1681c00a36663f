//! XLSX styles (styles.xml) read/write helpers

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sheetmap_core::{CellMark, CellValue, NumberFormat};

// === Reading ===

/// Cell formats of a workbook, indexed by the `s` attribute of a cell
#[derive(Debug, Default)]
pub(crate) struct CellFormats {
    formats: Vec<NumberFormat>,
}

impl CellFormats {
    /// Whether the cell format at `xf_id` displays numbers as dates
    pub(crate) fn is_date(&self, xf_id: u32) -> bool {
        self.formats
            .get(xf_id as usize)
            .map(NumberFormat::is_date_format)
            .unwrap_or(false)
    }
}

pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<CellFormats> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_num_fmt_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|s| s.parse().ok());
                    let code = attr_value(&e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    xf_num_fmt_ids.push(id);
                }
                _ => {}
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let formats = xf_num_fmt_ids
        .into_iter()
        .map(|id| NumberFormat::from_id_with_custom(id, custom.get(&id).map(String::as_str)))
        .collect();

    Ok(CellFormats { formats })
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|s| s.to_string()))
}

// === Writing ===

/// The fixed style table written by [`crate::XlsxWriter`]
///
/// cellXfs: 0 = default, 1 = error fill, 2 = date, 3 = date with error fill.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct XlsxStyleTable;

impl XlsxStyleTable {
    const XF_ERROR: u32 = 1;
    const XF_DATE: u32 = 2;
    const XF_DATE_ERROR: u32 = 3;

    pub(crate) fn xf_id_for(&self, value: &CellValue, mark: CellMark) -> u32 {
        let is_date = matches!(value, CellValue::DateTime(_));
        match (is_date, mark) {
            (false, CellMark::Normal) => 0,
            (false, CellMark::Error) => Self::XF_ERROR,
            (true, CellMark::Normal) => Self::XF_DATE,
            (true, CellMark::Error) => Self::XF_DATE_ERROR,
        }
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let date_fmt = NumberFormat::FIRST_CUSTOM_ID;
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1">
    <numFmt numFmtId="{date_fmt}" formatCode="{code}"/>
  </numFmts>
  <fonts count="1">
    <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFF0000"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="1">
    <border><left/><right/><top/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
    <xf numFmtId="{date_fmt}" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="{date_fmt}" fontId="0" fillId="2" borderId="0" xfId="0" applyNumberFormat="1" applyFill="1"/>
  </cellXfs>
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium9" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#,
            date_fmt = date_fmt,
            code = NumberFormat::DATE_TIME_CODE,
        )
    }

    /// Whether the error fill is the fill at `xf_id` of this table
    #[cfg(test)]
    pub(crate) fn is_error_xf(xf_id: u32) -> bool {
        xf_id == Self::XF_ERROR || xf_id == Self::XF_DATE_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_written_styles_read_back_as_dates() {
        let xml = XlsxStyleTable.to_styles_xml();
        let formats = read_styles_xml(xml.as_bytes()).unwrap();

        assert!(!formats.is_date(0));
        assert!(!formats.is_date(1));
        assert!(formats.is_date(2));
        assert!(formats.is_date(3));
        assert!(!formats.is_date(99));
    }

    #[test]
    fn test_builtin_date_format_ids() {
        let xml = r#"<styleSheet><cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs>
            <cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"><alignment/></xf><xf numFmtId="4"/></cellXfs></styleSheet>"#;
        let formats = read_styles_xml(xml.as_bytes()).unwrap();

        assert!(!formats.is_date(0));
        assert!(formats.is_date(1));
        assert!(!formats.is_date(2));
    }

    #[test]
    fn test_xf_id_for() {
        let table = XlsxStyleTable;
        let date = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(table.xf_id_for(&CellValue::string("a"), CellMark::Normal), 0);
        assert!(XlsxStyleTable::is_error_xf(
            table.xf_id_for(&CellValue::string("a"), CellMark::Error)
        ));
        assert_eq!(table.xf_id_for(&CellValue::DateTime(date), CellMark::Normal), 2);
    }
}
