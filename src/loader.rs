//! CSV ingestion into the SQLite store.
//!
//! Reads the incidence and mortality export, skips rows whose numeric
//! cells are blank or unparseable, and replaces both store tables in a
//! single transaction.

use crate::analysis::aggregator;
use crate::error::SourceError;
use crate::models::Record;
use crate::source::sqlite::{self, LOCATIONS_TABLE, RECORDS_TABLE};
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Options for one load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    /// Show a spinner while rows are read.
    pub show_progress: bool,
}

/// Outcome of a load run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub locations: usize,
}

/// Position of each store column in the CSV header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    cancer_type: usize,
    year: usize,
    sex: usize,
    state: usize,
    mortality_count: usize,
    mortality_rate: usize,
    incidence_rate: usize,
    incidence_count: usize,
}

/// Lowercase a header and replace spaces and slashes with underscores,
/// so "Cancer group/site" becomes "cancer_group_site".
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '/'], "_")
}

impl ColumnIndex {
    /// Locate every column, accepting the export's headers or the store's
    /// own column names.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, SourceError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| -> Result<usize, SourceError> {
            names
                .iter()
                .position(|name| aliases.contains(&name.as_str()))
                .ok_or_else(|| SourceError::InvalidRow(format!("missing column '{}'", aliases[0])))
        };

        Ok(Self {
            cancer_type: find(&["cancer_type", "cancer_group_site"])?,
            year: find(&["year"])?,
            sex: find(&["sex"])?,
            state: find(&["state", "state_or_territory"])?,
            mortality_count: find(&["mortality_count"])?,
            mortality_rate: find(&["mortality_rate"])?,
            incidence_rate: find(&["incidence_rate"])?,
            incidence_count: find(&["incidence_count"])?,
        })
    }
}

fn text_cell(row: &StringRecord, idx: usize, column: &str) -> Result<String, SourceError> {
    match row.get(idx).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(SourceError::InvalidRow(format!("blank {}", column))),
    }
}

fn number_cell(row: &StringRecord, idx: usize, column: &str) -> Result<f64, SourceError> {
    // The export writes thousands separators into counts
    let raw = row.get(idx).unwrap_or("").trim().replace(',', "");
    if raw.is_empty() {
        return Err(SourceError::InvalidRow(format!("blank {}", column)));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SourceError::InvalidRow(format!("{} is not a number: '{}'", column, raw)))
}

fn integer_cell(row: &StringRecord, idx: usize, column: &str) -> Result<i64, SourceError> {
    let value = number_cell(row, idx, column)?;
    if value.fract() != 0.0 {
        return Err(SourceError::InvalidRow(format!(
            "{} is not a whole number: {}",
            column, value
        )));
    }
    // 2^63; `as i64` would saturate anything outside this range
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if !(-BOUND..BOUND).contains(&value) {
        return Err(SourceError::InvalidRow(format!(
            "{} out of range: {}",
            column, value
        )));
    }
    Ok(value as i64)
}

/// Convert one CSV row into a record.
pub fn parse_record(row: &StringRecord, cols: &ColumnIndex) -> Result<Record, SourceError> {
    let year = integer_cell(row, cols.year, "year")?;
    Ok(Record {
        cancer_type: text_cell(row, cols.cancer_type, "cancer_type")?,
        year: i32::try_from(year)
            .map_err(|_| SourceError::InvalidRow(format!("year out of range: {}", year)))?,
        sex: text_cell(row, cols.sex, "sex")?,
        state: text_cell(row, cols.state, "state")?,
        mortality_count: integer_cell(row, cols.mortality_count, "mortality_count")?,
        mortality_rate: number_cell(row, cols.mortality_rate, "mortality_rate")?,
        incidence_rate: number_cell(row, cols.incidence_rate, "incidence_rate")?,
        incidence_count: number_cell(row, cols.incidence_count, "incidence_count")?,
    })
}

/// Records parsed from a CSV stream plus the number of rows dropped.
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub records: Vec<Record>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Parse every row of a CSV stream. Rows that fail to convert are logged
/// and counted, not fatal; a missing column or malformed CSV is.
pub fn read_records<R: Read>(
    reader: R,
    progress: Option<&ProgressBar>,
) -> Result<ParsedCsv, SourceError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let cols = ColumnIndex::from_headers(rdr.headers()?)?;
    debug!("CSV column layout: {:?}", cols);

    let mut parsed = ParsedCsv::default();
    for (line, result) in rdr.records().enumerate() {
        let row = result?;
        parsed.rows_read += 1;

        match parse_record(&row, &cols) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                // Header is line 1
                debug!("Skipping CSV line {}: {}", line + 2, e);
                parsed.rows_skipped += 1;
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok(parsed)
}

fn progress_spinner(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    Some(pb)
}

fn table_count(conn: &Connection, table: &str) -> Result<usize, SourceError> {
    let count: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Load the CSV at `options.csv_path` into the database at
/// `options.db_path`, replacing any existing tables.
pub fn load_csv(options: &LoadOptions) -> Result<LoadSummary> {
    info!("Loading data from {}", options.csv_path.display());

    let file = std::fs::File::open(&options.csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", options.csv_path.display()))?;

    let progress = progress_spinner(options.show_progress);
    let parsed = read_records(file, progress.as_ref())
        .with_context(|| format!("Failed to read CSV file: {}", options.csv_path.display()))?;
    if let Some(pb) = progress {
        pb.finish_with_message("read complete");
    }

    info!("Loaded {} rows from CSV", parsed.rows_read);
    if parsed.rows_skipped > 0 {
        warn!(
            "Skipped {} rows with blank or invalid values",
            parsed.rows_skipped
        );
    }

    let locations = aggregator::first_seen_locations(&parsed.records);

    let mut conn = Connection::open(&options.db_path)
        .with_context(|| format!("Failed to open database: {}", options.db_path.display()))?;
    let tx = conn.transaction().context("Failed to start transaction")?;
    sqlite::create_schema(&tx)?;
    let rows_loaded = sqlite::insert_records(&tx, &parsed.records)?;
    info!("Created table {} with {} rows", RECORDS_TABLE, rows_loaded);
    let location_count = sqlite::insert_locations(&tx, &locations)?;
    info!("Created location table with {} states", location_count);
    tx.commit().context("Failed to commit load")?;

    let stored = table_count(&conn, RECORDS_TABLE)?;
    let stored_locations = table_count(&conn, LOCATIONS_TABLE)?;
    info!("Verification: {} rows in {}", stored, RECORDS_TABLE);
    info!("Verification: {} rows in {}", stored_locations, LOCATIONS_TABLE);
    if stored != rows_loaded || stored_locations != location_count {
        bail!(
            "Verification failed: expected {} rows and {} locations, found {} and {}",
            rows_loaded,
            location_count,
            stored,
            stored_locations
        );
    }

    info!("Data loading completed successfully");
    Ok(LoadSummary {
        rows_read: parsed.rows_read,
        rows_loaded,
        rows_skipped: parsed.rows_skipped,
        locations: location_count,
    })
}
