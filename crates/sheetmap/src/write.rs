//! Row serializer: one record into one row

use sheetmap_core::{CellValue, Row};

use crate::error::FieldError;
use crate::header::HeaderMap;
use crate::record::FieldAccessor;

/// Write the header texts of `map` into `row`, one column per pair
pub fn write_header_row(map: &HeaderMap, row: &mut Row) {
    for (col, (_, header)) in (0u16..).zip(map.iter()) {
        row.set_value(col, header);
    }
}

/// Write the mapped fields of `record` into `row`
///
/// A field that can't be read adds a [`FieldError`] to `errors`; its cell
/// gets `placeholder` (blank when `None`) and is marked as an error cell.
pub fn serialize_record<R: FieldAccessor>(
    map: &HeaderMap,
    record: &R,
    record_index: usize,
    row: &mut Row,
    placeholder: Option<&str>,
    errors: &mut Vec<FieldError>,
) {
    for (col, (field, _)) in (0u16..).zip(map.iter()) {
        let cell = row.new_cell(col);
        match record.get_field(field) {
            Ok(value) => cell.set_value(value.to_cell_value()),
            Err(cause) => {
                tracing::trace!(
                    record = record_index,
                    field,
                    error = %cause,
                    "field unreadable"
                );
                errors.push(FieldError {
                    record_index,
                    field_name: field.to_string(),
                    cause,
                });
                cell.set_value(CellValue::string(placeholder.unwrap_or_default()));
                cell.mark_as_error();
            }
        }
    }
}
