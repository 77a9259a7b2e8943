//! In-memory record store.

use crate::analysis::aggregator;
use crate::error::SourceError;
use crate::models::{DataFilter, Location, Record, Table};
use crate::source::DataSource;

/// A fixed table held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Table,
}

impl MemorySource {
    pub fn new(records: Table) -> Self {
        Self { records }
    }
}

impl DataSource for MemorySource {
    fn fetch(&self, filter: &DataFilter) -> Result<Table, SourceError> {
        let mut rows: Vec<Record> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.state.cmp(&b.state)));
        Ok(rows)
    }

    /// Unique states in first-seen order, numbered from 1.
    fn locations(&self) -> Result<Vec<Location>, SourceError> {
        Ok(aggregator::first_seen_locations(&self.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, sample_table};

    #[test]
    fn test_fetch_filters_and_orders() {
        let source = MemorySource::new(vec![
            record("Victoria", 2020, "Lung cancer", 1.0),
            record("Tasmania", 2019, "Lung cancer", 2.0),
            record("Queensland", 2020, "Melanoma", 3.0),
        ]);

        let all = source.fetch(&DataFilter::new()).unwrap();
        let order: Vec<_> = all.iter().map(|r| (r.year, r.state.as_str())).collect();
        assert_eq!(
            order,
            vec![(2019, "Tasmania"), (2020, "Queensland"), (2020, "Victoria")]
        );

        let lung = source
            .fetch(&DataFilter::new().with_cancer_type("Lung cancer").with_year(2020))
            .unwrap();
        assert_eq!(lung.len(), 1);
        assert_eq!(lung[0].state, "Victoria");
    }

    #[test]
    fn test_default_lookups() {
        let source = MemorySource::new(sample_table());

        assert_eq!(
            source.distinct_states().unwrap(),
            vec!["Queensland", "Tasmania", "Victoria"]
        );
        assert_eq!(
            source.distinct_cancer_types().unwrap(),
            vec!["Lung cancer", "Melanoma"]
        );
        let range = source.years_range().unwrap().unwrap();
        assert_eq!((range.min_year, range.max_year), (2018, 2020));
        assert_eq!(source.count().unwrap(), 18);
    }

    #[test]
    fn test_locations_first_seen_order() {
        let source = MemorySource::new(sample_table());
        let locations = source.locations().unwrap();

        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].id, 1);
        assert_eq!(locations[0].name, "Victoria");
        assert_eq!(locations[2].name, "Queensland");
    }

    #[test]
    fn test_empty_store() {
        let source = MemorySource::default();
        assert!(source.fetch(&DataFilter::new()).unwrap().is_empty());
        assert_eq!(source.years_range().unwrap(), None);
    }
}
