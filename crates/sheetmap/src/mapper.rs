//! Mapping engine: whole-document read, write and append
//!
//! A [`Mapper`] drives the row materializer and serializer over the first
//! sheet of a document. Structural problems (bad bytes, no sheet, an
//! unrecognized header row) fail the call with a [`MapError`]; problems with
//! single cells or fields are collected and returned beside the result.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use sheetmap_core::{Workbook, Worksheet, MAX_COLS};

use crate::coerce::CoercionRegistry;
use crate::document::{self, DocumentFormat};
use crate::error::{CellError, FieldError, MapError, MapResult};
use crate::header::{ColumnMeta, HeaderMap};
use crate::options::{CommitPolicy, ReadOptions, WriteOptions};
use crate::read::materialize_row;
use crate::record::FieldAccessor;
use crate::write::{serialize_record, write_header_row};

/// Records read from a document, with the cells that failed
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<R> {
    /// One record per non-empty data row, in row order
    pub records: Vec<R>,
    /// Cells that could not be read into their field
    pub cell_errors: Vec<CellError>,
}

impl<R> Parsed<R> {
    /// Check if every cell was read
    pub fn is_clean(&self) -> bool {
        self.cell_errors.is_empty()
    }
}

/// Outcome of a write or append
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    /// Fields that could not be read, in record order
    pub field_errors: Vec<FieldError>,
    /// Whether the document was persisted
    pub committed: bool,
    /// Data rows persisted; zero when the write was discarded
    pub rows_written: usize,
}

/// The mapping engine
///
/// Holds the coercion table by reference; the mapper itself is stateless
/// and cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'r> {
    registry: &'r CoercionRegistry,
}

impl Default for Mapper<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper<'static> {
    /// Mapper on the standard coercion table
    pub fn new() -> Self {
        Self {
            registry: CoercionRegistry::standard(),
        }
    }
}

impl<'r> Mapper<'r> {
    /// Mapper on a custom coercion table
    pub fn with_registry(registry: &'r CoercionRegistry) -> Self {
        Self { registry }
    }

    /// The coercion table in use
    pub fn registry(&self) -> &'r CoercionRegistry {
        self.registry
    }

    // ===== Read =====

    /// Read the first sheet of `workbook` into records
    ///
    /// Row 0 is the header row. Data rows that don't exist or have no cells
    /// are skipped.
    pub fn read_workbook<R: FieldAccessor>(
        &self,
        map: &HeaderMap,
        workbook: &Workbook,
    ) -> MapResult<Parsed<R>> {
        let sheet = workbook.first_sheet().ok_or(MapError::EmptyDocument)?;
        let header_row = sheet.row(0).ok_or(MapError::InvalidHeaderRow)?;
        let meta = ColumnMeta::resolve(header_row, map);
        if meta.is_empty() {
            return Err(MapError::InvalidHeaderRow);
        }

        let mut records = Vec::new();
        let mut cell_errors = Vec::new();
        for row in sheet.iter_rows() {
            if row.index() == 0 || row.is_empty() {
                continue;
            }
            let data_row_index = (row.index() - 1) as usize;
            records.push(materialize_row(
                &meta,
                row,
                data_row_index,
                self.registry,
                &mut cell_errors,
            ));
        }

        tracing::debug!(
            columns = meta.len(),
            records = records.len(),
            cell_errors = cell_errors.len(),
            "read records"
        );
        Ok(Parsed {
            records,
            cell_errors,
        })
    }

    /// Read records from a stream; the format defaults to XLSX
    pub fn read_records<R, S>(
        &self,
        map: &HeaderMap,
        source: S,
        options: &ReadOptions,
    ) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        S: Read + Seek,
    {
        let workbook = document::load(source, options.format.unwrap_or_default(), &options.csv)?;
        self.read_workbook(map, &workbook)
    }

    /// Read records from a file
    pub fn read_records_from_path<R, P>(
        &self,
        map: &HeaderMap,
        path: P,
        options: &ReadOptions,
    ) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        let workbook = document::load_file(path, options.format, &options.csv)?;
        self.read_workbook(map, &workbook)
    }

    /// Read records with field names derived from the header row
    ///
    /// `"First Name"` fills field `firstName`. Blank header cells are
    /// ignored.
    pub fn read_workbook_derived<R: FieldAccessor>(
        &self,
        workbook: &Workbook,
    ) -> MapResult<Parsed<R>> {
        let map = derive_reverse_map(workbook)?;
        self.read_workbook(&map, workbook)
    }

    /// Stream form of [`Mapper::read_workbook_derived`]
    pub fn read_records_derived<R, S>(&self, source: S, options: &ReadOptions) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        S: Read + Seek,
    {
        let workbook = document::load(source, options.format.unwrap_or_default(), &options.csv)?;
        self.read_workbook_derived(&workbook)
    }

    /// File form of [`Mapper::read_workbook_derived`]
    pub fn read_records_derived_from_path<R, P>(
        &self,
        path: P,
        options: &ReadOptions,
    ) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        let workbook = document::load_file(path, options.format, &options.csv)?;
        self.read_workbook_derived(&workbook)
    }

    /// Read records into `R` with the columns of its settable fields
    ///
    /// Headers are the field names as title text, so `firstName` is read from
    /// a `First Name` column.
    pub fn read_records_for<R, S>(&self, source: S, options: &ReadOptions) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        S: Read + Seek,
    {
        let map = HeaderMap::for_reading::<R>()?;
        self.read_records(&map, source, options)
    }

    /// File form of [`Mapper::read_records_for`]
    pub fn read_records_for_path<R, P>(
        &self,
        path: P,
        options: &ReadOptions,
    ) -> MapResult<Parsed<R>>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        let map = HeaderMap::for_reading::<R>()?;
        self.read_records_from_path(&map, path, options)
    }

    /// Read records from a stream, swallowing structural errors and cell
    /// errors alike
    ///
    /// A malformed document, a missing sheet or an unrecognized header row
    /// give an empty list. Configuration and IO errors are still returned.
    pub fn parse_ignoring_errors<R, S>(
        &self,
        map: &HeaderMap,
        source: S,
        options: &ReadOptions,
    ) -> MapResult<Vec<R>>
    where
        R: FieldAccessor,
        S: Read + Seek,
    {
        ignore_structural(self.read_records(map, source, options))
    }

    /// File form of [`Mapper::parse_ignoring_errors`]
    pub fn parse_ignoring_errors_from_path<R, P>(
        &self,
        map: &HeaderMap,
        path: P,
        options: &ReadOptions,
    ) -> MapResult<Vec<R>>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        ignore_structural(self.read_records_from_path(map, path, options))
    }

    /// [`Mapper::parse_ignoring_errors`] with the columns of `R`'s settable
    /// fields
    pub fn parse_ignoring_errors_for<R, S>(&self, source: S, options: &ReadOptions) -> MapResult<Vec<R>>
    where
        R: FieldAccessor,
        S: Read + Seek,
    {
        ignore_structural(self.read_records_for(source, options))
    }

    /// File form of [`Mapper::parse_ignoring_errors_for`]
    pub fn parse_ignoring_errors_for_path<R, P>(
        &self,
        path: P,
        options: &ReadOptions,
    ) -> MapResult<Vec<R>>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        ignore_structural(self.read_records_for_path(path, options))
    }

    // ===== Write =====

    /// Lay out records in a new single-sheet workbook: the header row, then
    /// one row per record
    pub fn write_workbook<R: FieldAccessor>(
        &self,
        map: &HeaderMap,
        records: &[R],
        placeholder: Option<&str>,
    ) -> MapResult<(Workbook, Vec<FieldError>)> {
        check_columns(map)?;

        let mut workbook = Workbook::new();
        let sheet = workbook.first_sheet_mut().ok_or(MapError::EmptyDocument)?;
        write_header_row(map, sheet.new_row(0)?);

        let field_errors = append_rows(sheet, map, records, 1, placeholder)?;
        Ok((workbook, field_errors))
    }

    /// Write records to a stream in `options.format`
    ///
    /// Under [`CommitPolicy::OnlyIfNoErrors`] nothing at all is written to
    /// `sink` when a field failed.
    pub fn write_records<R, W>(
        &self,
        map: &HeaderMap,
        records: &[R],
        sink: W,
        options: &WriteOptions,
    ) -> MapResult<WriteReport>
    where
        R: FieldAccessor,
        W: Write + Seek,
    {
        let (workbook, field_errors) =
            self.write_workbook(map, records, options.placeholder.as_deref())?;
        let committed = should_commit(options.commit, &field_errors);
        if committed {
            document::save(&workbook, sink, options.format, &options.csv)?;
        }
        Ok(report(field_errors, committed, records.len()))
    }

    /// Write records to a file in the format of its extension
    ///
    /// When the commit policy rejects the write the file is not created.
    pub fn write_records_to_path<R, P>(
        &self,
        map: &HeaderMap,
        records: &[R],
        path: P,
        options: &WriteOptions,
    ) -> MapResult<WriteReport>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        DocumentFormat::from_path(path)?;
        let (workbook, field_errors) =
            self.write_workbook(map, records, options.placeholder.as_deref())?;
        let committed = should_commit(options.commit, &field_errors);
        if committed {
            document::save_file(&workbook, path, &options.csv)?;
        }
        Ok(report(field_errors, committed, records.len()))
    }

    /// Write only if every field of every record can be read
    pub fn save_if_no_errors<R, W>(
        &self,
        map: &HeaderMap,
        records: &[R],
        sink: W,
        options: &WriteOptions,
    ) -> MapResult<WriteReport>
    where
        R: FieldAccessor,
        W: Write + Seek,
    {
        let options = options.clone().commit(CommitPolicy::OnlyIfNoErrors);
        self.write_records(map, records, sink, &options)
    }

    /// Write records to a stream with columns derived from `R`'s gettable
    /// fields
    pub fn write_records_derived<R, W>(
        &self,
        records: &[R],
        sink: W,
        options: &WriteOptions,
    ) -> MapResult<WriteReport>
    where
        R: FieldAccessor,
        W: Write + Seek,
    {
        let map = HeaderMap::for_writing::<R>()?;
        self.write_records(&map, records, sink, options)
    }

    /// Append records below the last row of an existing file's first sheet
    ///
    /// The existing rows are left as they are; the header row is not
    /// checked. The document is saved back in its own format.
    pub fn append_records<R, P>(
        &self,
        map: &HeaderMap,
        records: &[R],
        path: P,
        options: &WriteOptions,
    ) -> MapResult<WriteReport>
    where
        R: FieldAccessor,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        check_columns(map)?;
        if !path.is_file() {
            return Err(MapError::DocumentNotFound(path.to_path_buf()));
        }
        let format = DocumentFormat::from_path(path)?;

        let mut workbook = {
            let file = File::open(path)?;
            document::load(file, format, &ReadOptions::default().csv)?
        };
        let sheet = workbook
            .first_sheet_mut()
            .ok_or(MapError::EmptyDocument)?;
        let start = sheet.last_row_index().map_or(0, |last| last + 1);

        let field_errors = append_rows(sheet, map, records, start, options.placeholder.as_deref())?;
        let committed = should_commit(options.commit, &field_errors);
        if committed {
            document::save_file(&workbook, path, &options.csv)?;
        }
        tracing::debug!(
            path = %path.display(),
            start_row = start,
            records = records.len(),
            "appended records"
        );
        Ok(report(field_errors, committed, records.len()))
    }
}

/// Serialize `records` into rows `start..`
fn append_rows<R: FieldAccessor>(
    sheet: &mut Worksheet,
    map: &HeaderMap,
    records: &[R],
    start: u32,
    placeholder: Option<&str>,
) -> MapResult<Vec<FieldError>> {
    let mut field_errors = Vec::new();
    for ((record_index, record), row_index) in records.iter().enumerate().zip(start..) {
        let row = sheet.new_row(row_index)?;
        serialize_record(map, record, record_index, row, placeholder, &mut field_errors);
    }
    Ok(field_errors)
}

fn check_columns(map: &HeaderMap) -> MapResult<()> {
    if map.len() > usize::from(MAX_COLS) {
        return Err(MapError::InvalidMapping(format!(
            "the header map has {} columns, more than a sheet can hold",
            map.len()
        )));
    }
    Ok(())
}

fn should_commit(policy: CommitPolicy, field_errors: &[FieldError]) -> bool {
    let commit = policy.should_commit(field_errors.len());
    if !commit {
        tracing::info!(
            field_errors = field_errors.len(),
            "write discarded: some fields could not be read"
        );
    }
    commit
}

fn report(field_errors: Vec<FieldError>, committed: bool, records: usize) -> WriteReport {
    tracing::debug!(
        records,
        field_errors = field_errors.len(),
        committed,
        "wrote records"
    );
    WriteReport {
        rows_written: if committed { records } else { 0 },
        field_errors,
        committed,
    }
}

fn ignore_structural<R>(result: MapResult<Parsed<R>>) -> MapResult<Vec<R>> {
    match result {
        Ok(parsed) => Ok(parsed.records),
        Err(err) if err.is_structural() => {
            tracing::debug!(error = %err, "ignoring unreadable document");
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Header -> field map derived from the texts of the first row
fn derive_reverse_map(workbook: &Workbook) -> MapResult<HeaderMap> {
    let sheet = workbook.first_sheet().ok_or(MapError::EmptyDocument)?;
    let header_row = sheet.row(0).ok_or(MapError::InvalidHeaderRow)?;
    HeaderMap::from_header_row(header_row).map_err(|_| MapError::InvalidHeaderRow)
}
