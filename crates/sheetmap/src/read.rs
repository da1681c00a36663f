//! Row materializer: one data row into one record

use sheetmap_core::Row;

use crate::coerce::{CoercionRegistry, RawCellValue};
use crate::error::CellError;
use crate::header::ColumnMeta;
use crate::record::FieldAccessor;

/// Build a record from the cells of `row`
///
/// Every column up to the row's last populated one is visited; columns
/// missing from `meta` are skipped. A cell that fails to set its field adds
/// a [`CellError`] to `errors` and the row carries on, so the record is
/// returned even when every cell failed.
pub fn materialize_row<R: FieldAccessor>(
    meta: &ColumnMeta,
    row: &Row,
    data_row_index: usize,
    registry: &CoercionRegistry,
    errors: &mut Vec<CellError>,
) -> R {
    let mut record = R::new_record();

    for col in 0..row.last_column_index_exclusive() {
        let Some(binding) = meta.get(col) else {
            continue;
        };
        let raw = row
            .cell(col)
            .map(|cell| RawCellValue::from_cell(&cell.value))
            .unwrap_or(RawCellValue::Absent);

        if let Err(cause) = record.set_field(&binding.field, &raw, registry) {
            tracing::trace!(
                row = data_row_index,
                column = col,
                field = %binding.field,
                error = %cause,
                "cell rejected"
            );
            errors.push(CellError {
                row_index: data_row_index,
                column_index: usize::from(col),
                field_name: binding.field.clone(),
                header_text: binding.header.clone(),
                cause,
            });
        }
    }

    record
}
