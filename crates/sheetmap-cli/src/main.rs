//! sheetmap CLI - map spreadsheet rows to records and back

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use sheetmap::document;
use sheetmap::prelude::*;
use sheetmap::{CellAddress, CsvReadOptions, Workbook};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(author, version, about = "Map spreadsheet rows to records and back")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header row with the field name derived for each column
    Headers {
        /// Input document (xlsx, csv)
        input: PathBuf,
    },

    /// Print every data row as a JSON object, one per line
    Dump {
        /// Input document (xlsx, csv)
        input: PathBuf,

        /// Header map as a JSON list of {"field", "header"} objects
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Print cell errors to stderr
        #[arg(short, long)]
        errors: bool,
    },

    /// Read records from one document and write them to another
    Convert {
        /// Input document (xlsx, csv)
        input: PathBuf,

        /// Output document; the format follows the extension
        output: PathBuf,

        /// Header map as a JSON list of {"field", "header"} objects
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Write nothing if any field fails
        #[arg(short, long)]
        strict: bool,
    },

    /// Append the records of one document below the rows of another
    Append {
        /// Existing document to extend
        existing: PathBuf,

        /// Document holding the records to append
        input: PathBuf,

        /// Header map as a JSON list of {"field", "header"} objects
        #[arg(short, long)]
        map: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Headers { input } => show_headers(&input),
        Commands::Dump { input, map, errors } => dump(&input, map.as_deref(), errors),
        Commands::Convert {
            input,
            output,
            map,
            strict,
        } => convert(&input, &output, map.as_deref(), strict),
        Commands::Append {
            existing,
            input,
            map,
        } => append(&existing, &input, map.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path) -> Result<Workbook> {
    document::load_file(input, None, &CsvReadOptions::default())
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

fn load_map(path: Option<&Path>) -> Result<Option<HeaderMap>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read header map '{}'", path.display()))?;
    let map = serde_json::from_str(&text)
        .with_context(|| format!("Invalid header map '{}'", path.display()))?;
    Ok(Some(map))
}

/// The given map, or one derived from the document's header row
fn header_map(workbook: &Workbook, map: Option<&Path>) -> Result<HeaderMap> {
    if let Some(map) = load_map(map)? {
        return Ok(map);
    }
    let header_row = workbook
        .first_sheet()
        .and_then(|sheet| sheet.row(0))
        .context("The document has no header row")?;
    HeaderMap::from_header_row(header_row)
        .context("Failed to derive field names from the header row")
}

fn read_records(input: &Path, map: Option<&Path>) -> Result<(HeaderMap, Parsed<MapRecord>)> {
    let workbook = open(input)?;
    let map = header_map(&workbook, map)?;
    let parsed = Mapper::new()
        .read_workbook(&map, &workbook)
        .with_context(|| format!("Failed to read records from '{}'", input.display()))?;
    Ok((map, parsed))
}

fn show_headers(input: &Path) -> Result<()> {
    let workbook = open(input)?;
    let header_row = workbook
        .first_sheet()
        .and_then(|sheet| sheet.row(0))
        .context("The document has no header row")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (col, cell) in header_row.iter() {
        let Some(text) = RawCellValue::from_cell(&cell.value).describe() else {
            continue;
        };
        writeln!(
            out,
            "{}\t{}\t{}",
            CellAddress::column_to_letters(col),
            text,
            sheetmap::words_to_camel_case(&text)
        )?;
    }
    Ok(())
}

fn dump(input: &Path, map: Option<&Path>, show_errors: bool) -> Result<()> {
    let (_, parsed) = read_records(input, map)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &parsed.records {
        serde_json::to_writer(&mut out, &record_to_json(record))?;
        writeln!(out)?;
    }
    out.flush()?;

    if show_errors {
        for err in &parsed.cell_errors {
            warn!(
                row = err.row_index_one_based(),
                column = err.column_index_one_based(),
                header = %err.header_text,
                "{}",
                err.cause
            );
        }
    }
    Ok(())
}

fn convert(input: &Path, output: &Path, map: Option<&Path>, strict: bool) -> Result<()> {
    let (map, parsed) = read_records(input, map)?;
    if !parsed.is_clean() {
        warn!(cell_errors = parsed.cell_errors.len(), "some cells could not be read");
    }

    let commit = if strict {
        CommitPolicy::OnlyIfNoErrors
    } else {
        CommitPolicy::Always
    };
    let report = Mapper::new()
        .write_records_to_path(
            &map,
            &parsed.records,
            output,
            &WriteOptions::default().commit(commit),
        )
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    print_report(&report, output)
}

fn append(existing: &Path, input: &Path, map: Option<&Path>) -> Result<()> {
    let (map, parsed) = read_records(input, map)?;
    let report = Mapper::new()
        .append_records(&map, &parsed.records, existing, &WriteOptions::default())
        .with_context(|| format!("Failed to append to '{}'", existing.display()))?;

    print_report(&report, existing)
}

fn print_report(report: &WriteReport, target: &Path) -> Result<()> {
    for err in &report.field_errors {
        warn!(record = err.record_index, field = %err.field_name, "{}", err.cause);
    }
    if report.committed {
        info!(rows = report.rows_written, path = %target.display(), "wrote records");
        Ok(())
    } else {
        anyhow::bail!(
            "Nothing written to '{}': {} fields could not be read",
            target.display(),
            report.field_errors.len()
        )
    }
}

fn record_to_json(record: &MapRecord) -> Value {
    let object: Map<String, Value> = record
        .iter()
        .map(|(key, value)| (key.to_string(), field_to_json(value)))
        .collect();
    Value::Object(object)
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::I16(n) => Value::from(*n),
        FieldValue::I32(n) => Value::from(*n),
        FieldValue::I64(n) => Value::from(*n),
        FieldValue::F64(n) => Value::from(*n),
        other => Value::String(other.to_text().unwrap_or_default()),
    }
}
