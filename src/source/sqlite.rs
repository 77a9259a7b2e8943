//! SQLite-backed record store.
//!
//! Opens a read-only connection per call, so a `SqliteSource` can be
//! shared between threads without a pool.

use crate::error::SourceError;
use crate::models::{DataFilter, Location, Record, Table, YearsRange};
use crate::source::DataSource;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const RECORDS_TABLE: &str = "incidence_and_mortality_by_state";
pub const LOCATIONS_TABLE: &str = "location";

const RECORD_COLUMNS: &str = "cancer_type, year, sex, state, mortality_count, \
                              mortality_rate, incidence_rate, incidence_count";

/// Drop and recreate both tables.
pub fn create_schema(conn: &Connection) -> Result<(), SourceError> {
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {records};
         DROP TABLE IF EXISTS {locations};
         CREATE TABLE {records} (
             cancer_type     TEXT    NOT NULL,
             year            INTEGER NOT NULL,
             sex             TEXT    NOT NULL,
             state           TEXT    NOT NULL,
             mortality_count INTEGER NOT NULL,
             mortality_rate  REAL    NOT NULL,
             incidence_rate  REAL    NOT NULL,
             incidence_count REAL    NOT NULL
         );
         CREATE INDEX idx_{records}_filter ON {records} (state, year, cancer_type);
         CREATE TABLE {locations} (
             id   INTEGER PRIMARY KEY,
             name TEXT NOT NULL UNIQUE
         );",
        records = RECORDS_TABLE,
        locations = LOCATIONS_TABLE,
    ))?;
    Ok(())
}

/// Insert records in one statement loop. Call inside a transaction.
pub fn insert_records(conn: &Connection, records: &[Record]) -> Result<usize, SourceError> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        RECORDS_TABLE, RECORD_COLUMNS
    ))?;

    for r in records {
        stmt.execute(params![
            r.cancer_type,
            r.year,
            r.sex,
            r.state,
            r.mortality_count,
            r.mortality_rate,
            r.incidence_rate,
            r.incidence_count,
        ])?;
    }

    Ok(records.len())
}

/// Insert location rows.
pub fn insert_locations(conn: &Connection, locations: &[Location]) -> Result<usize, SourceError> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} (id, name) VALUES (?1, ?2)",
        LOCATIONS_TABLE
    ))?;

    for loc in locations {
        stmt.execute(params![loc.id, loc.name])?;
    }

    Ok(locations.len())
}

/// Build the filtered select for `filter`, with positional parameters.
pub fn build_query(filter: &DataFilter) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {} FROM {} WHERE 1=1", RECORD_COLUMNS, RECORDS_TABLE);
    let mut params: Vec<Value> = Vec::new();

    if let Some(ref state) = filter.state {
        params.push(Value::Text(state.clone()));
        sql.push_str(&format!(" AND state = ?{}", params.len()));
    }
    if let Some(year) = filter.year {
        params.push(Value::Integer(year.into()));
        sql.push_str(&format!(" AND year = ?{}", params.len()));
    }
    if let Some(ref cancer_type) = filter.cancer_type {
        params.push(Value::Text(cancer_type.clone()));
        sql.push_str(&format!(" AND cancer_type = ?{}", params.len()));
    }

    sql.push_str(" ORDER BY year, state");
    (sql, params)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        cancer_type: row.get(0)?,
        year: row.get(1)?,
        sex: row.get(2)?,
        state: row.get(3)?,
        mortality_count: row.get(4)?,
        mortality_rate: row.get(5)?,
        incidence_rate: row.get(6)?,
        incidence_count: row.get(7)?,
    })
}

/// Record store in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    /// Create a source for `path`. The file must already exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database not found: {}", path.display()),
            )));
        }
        Ok(Self { path })
    }

    fn connect(&self) -> Result<Connection, SourceError> {
        debug!("Opening database {}", self.path.display());
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Check the store is reachable and report its SQLite version.
    pub fn test_connection(&self) -> Result<String, SourceError> {
        let conn = self.connect()?;
        let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        info!("Database version: SQLite {}", version);
        Ok(version)
    }

    fn query_strings(&self, sql: &str) -> Result<Vec<String>, SourceError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl DataSource for SqliteSource {
    fn fetch(&self, filter: &DataFilter) -> Result<Table, SourceError> {
        let (sql, params) = build_query(filter);
        debug!("Fetching records: {} {:?}", sql, params);

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn locations(&self) -> Result<Vec<Location>, SourceError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY id",
            LOCATIONS_TABLE
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(Location {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn distinct_states(&self) -> Result<Vec<String>, SourceError> {
        self.query_strings(&format!(
            "SELECT DISTINCT state FROM {} ORDER BY state",
            RECORDS_TABLE
        ))
    }

    fn distinct_cancer_types(&self) -> Result<Vec<String>, SourceError> {
        self.query_strings(&format!(
            "SELECT DISTINCT cancer_type FROM {} ORDER BY cancer_type",
            RECORDS_TABLE
        ))
    }

    fn years_range(&self) -> Result<Option<YearsRange>, SourceError> {
        let conn = self.connect()?;
        let (min, max): (Option<i32>, Option<i32>) = conn.query_row(
            &format!("SELECT MIN(year), MAX(year) FROM {}", RECORDS_TABLE),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(min.zip(max).map(|(min_year, max_year)| YearsRange { min_year, max_year }))
    }

    fn count(&self) -> Result<usize, SourceError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", RECORDS_TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
