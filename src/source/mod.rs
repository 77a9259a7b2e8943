//! Record stores.
//!
//! A [`DataSource`] returns the rows matching a [`DataFilter`]. The SQLite
//! store backs the CLI; the in-memory store backs tests and ad hoc tables.

pub mod memory;
pub mod service;
pub mod sqlite;

pub use memory::MemorySource;
pub use service::DataService;
pub use sqlite::SqliteSource;

use crate::analysis::aggregator;
use crate::error::SourceError;
use crate::models::{DataFilter, Location, Table, YearsRange};

/// Supplies records given optional state/year/cancer-type filters.
///
/// Rows come back ordered by year, then state. The lookup methods have
/// default implementations over a full fetch; stores with an index
/// override them.
pub trait DataSource: Send + Sync {
    fn fetch(&self, filter: &DataFilter) -> Result<Table, SourceError>;

    fn locations(&self) -> Result<Vec<Location>, SourceError>;

    fn distinct_states(&self) -> Result<Vec<String>, SourceError> {
        let rows = self.fetch(&DataFilter::default())?;
        Ok(aggregator::distinct(&rows, |r| r.state.as_str()))
    }

    fn distinct_cancer_types(&self) -> Result<Vec<String>, SourceError> {
        let rows = self.fetch(&DataFilter::default())?;
        Ok(aggregator::distinct(&rows, |r| r.cancer_type.as_str()))
    }

    /// `None` when the store holds no rows.
    fn years_range(&self) -> Result<Option<YearsRange>, SourceError> {
        let rows = self.fetch(&DataFilter::default())?;
        Ok(aggregator::years_range(&rows))
    }

    /// Total number of stored rows.
    fn count(&self) -> Result<usize, SourceError> {
        Ok(self.fetch(&DataFilter::default())?.len())
    }
}
