//! Data lookups served straight from the store.

use crate::analysis::aggregator;
use crate::error::{AnalyticsError, Result};
use crate::models::{
    DataFilter, HeatmapMatrix, Location, Metric, StateSummary, StateValue, Table, YearValue,
    YearsRange,
};
use crate::source::DataSource;
use std::sync::Arc;
use tracing::{debug, error};

/// Filtered record access plus the dashboard's lookup lists.
pub struct DataService<S> {
    source: Arc<S>,
    /// Name of the national aggregate row, hidden from state lists.
    national_label: String,
}

impl<S> Clone for DataService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            national_label: self.national_label.clone(),
        }
    }
}

impl<S: DataSource> DataService<S> {
    pub fn new(source: Arc<S>, national_label: impl Into<String>) -> Self {
        Self {
            source,
            national_label: national_label.into(),
        }
    }

    /// Rows matching `filter`, ordered by year then state.
    pub fn cancer_data(&self, filter: &DataFilter) -> Result<Table> {
        debug!("Fetching cancer data with filter {:?}", filter);
        self.source.fetch(filter).map_err(|e| {
            error!("Error fetching cancer data: {}", e);
            AnalyticsError::from(e)
        })
    }

    /// Distinct states, sorted, without the national aggregate.
    pub fn states(&self) -> Result<Vec<String>> {
        let mut states = self.source.distinct_states()?;
        states.retain(|s| *s != self.national_label);
        Ok(states)
    }

    pub fn cancer_types(&self) -> Result<Vec<String>> {
        Ok(self.source.distinct_cancer_types()?)
    }

    pub fn years_range(&self) -> Result<YearsRange> {
        self.source
            .years_range()?
            .ok_or_else(|| AnalyticsError::InsufficientData("No data available".to_string()))
    }

    pub fn locations(&self) -> Result<Vec<Location>> {
        Ok(self.source.locations()?)
    }

    /// Totals and averages over every record of one state.
    pub fn state_summary(&self, state: &str) -> Result<StateSummary> {
        let rows = self.cancer_data(&DataFilter::new().with_state(state))?;
        aggregator::summarize_state(state, &rows)
    }

    /// Per-year mean of `metric` for one state.
    pub fn yearly_series(
        &self,
        state: &str,
        metric: Metric,
        cancer_type: Option<&str>,
    ) -> Result<Vec<YearValue>> {
        let filter = DataFilter::from_parts(Some(state), None, cancer_type);
        let rows = self.cancer_data(&filter)?;
        if rows.is_empty() {
            return Err(AnalyticsError::InsufficientData(format!(
                "No data found for {}",
                state
            )));
        }
        Ok(aggregator::yearly_means(&rows, metric))
    }

    /// State x year matrix of mean `metric`.
    pub fn heatmap(&self, metric: Metric, cancer_type: Option<&str>) -> Result<HeatmapMatrix> {
        let rows = self.cancer_data(&DataFilter::from_parts(None, None, cancer_type))?;
        if rows.is_empty() {
            return Err(AnalyticsError::InsufficientData(
                "No data available for heatmap".to_string(),
            ));
        }
        Ok(aggregator::heatmap(&rows, metric, cancer_type))
    }

    /// Sum of `metric` per state at the latest year, for map shading.
    pub fn map_data(&self, metric: Metric) -> Result<Vec<StateValue>> {
        let rows = self.cancer_data(&DataFilter::new())?;
        Ok(aggregator::latest_state_totals(&rows, metric))
    }
}
