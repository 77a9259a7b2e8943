//! Data models for the cancer statistics engine.
//!
//! This module contains the row type fetched from the store, the filter
//! used to query it, and the typed result of every analytics operation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A numeric column that analytics can be computed over.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Metric {
    MortalityCount,
    #[default]
    MortalityRate,
    IncidenceRate,
    IncidenceCount,
}

impl Metric {
    /// All metrics, in column order.
    pub const ALL: [Metric; 4] = [
        Metric::MortalityCount,
        Metric::MortalityRate,
        Metric::IncidenceRate,
        Metric::IncidenceCount,
    ];

    /// Column name of the metric in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::MortalityCount => "mortality_count",
            Metric::MortalityRate => "mortality_rate",
            Metric::IncidenceRate => "incidence_rate",
            Metric::IncidenceCount => "incidence_count",
        }
    }

    /// Human readable label, e.g. "Mortality Rate".
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MortalityCount => "Mortality Count",
            Metric::MortalityRate => "Mortality Rate",
            Metric::IncidenceRate => "Incidence Rate",
            Metric::IncidenceCount => "Incidence Count",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "mortality_count" => Ok(Metric::MortalityCount),
            "mortality_rate" => Ok(Metric::MortalityRate),
            "incidence_rate" => Ok(Metric::IncidenceRate),
            "incidence_count" => Ok(Metric::IncidenceCount),
            other => Err(format!("Unknown metric: {}", other)),
        }
    }
}

/// One row of the incidence and mortality table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Cancer group or site, e.g. "Breast cancer".
    pub cancer_type: String,
    pub year: i32,
    pub sex: String,
    /// State or territory name.
    pub state: String,
    pub mortality_count: i64,
    /// Deaths per 100,000.
    pub mortality_rate: f64,
    /// New cases per 100,000.
    pub incidence_rate: f64,
    pub incidence_count: f64,
}

impl Record {
    /// Returns the value of the given metric for this row.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MortalityCount => self.mortality_count as f64,
            Metric::MortalityRate => self.mortality_rate,
            Metric::IncidenceRate => self.incidence_rate,
            Metric::IncidenceCount => self.incidence_count,
        }
    }
}

/// An ordered sequence of records. May be empty.
pub type Table = Vec<Record>;

/// Optional filters applied when fetching records.
///
/// Every field is independent; `None` means "do not filter on this column".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataFilter {
    pub state: Option<String>,
    pub year: Option<i32>,
    pub cancer_type: Option<String>,
}

impl DataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_cancer_type(mut self, cancer_type: impl Into<String>) -> Self {
        self.cancer_type = Some(cancer_type.into());
        self
    }

    /// Builds a filter from borrowed optional parts.
    pub fn from_parts(state: Option<&str>, year: Option<i32>, cancer_type: Option<&str>) -> Self {
        Self {
            state: state.map(String::from),
            year,
            cancer_type: cancer_type.map(String::from),
        }
    }

    /// Returns true if the record satisfies every set field.
    pub fn matches(&self, record: &Record) -> bool {
        self.state.as_deref().map_or(true, |s| record.state == s)
            && self.year.map_or(true, |y| record.year == y)
            && self
                .cancer_type
                .as_deref()
                .map_or(true, |c| record.cancer_type == c)
    }
}

/// Qualitative classification of a fitted slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

impl TrendDirection {
    /// Returns an arrow representation of the direction.
    pub fn arrow(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "↑",
            TrendDirection::Decreasing => "↓",
            TrendDirection::Stable => "→",
        }
    }
}

/// Mean metric value for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Result of a linear trend fit over yearly means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub metric: Metric,
    pub trend_direction: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation between year and value.
    pub correlation: f64,
    pub percent_change: f64,
    pub years_analyzed: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub first_value: f64,
    pub last_value: f64,
    pub mean_value: f64,
    pub std_value: f64,
}

/// A state paired with an aggregated metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    pub state: String,
    pub value: f64,
}

/// Summary statistics for one state in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    /// Mean of the metric at the latest year present for the state.
    pub latest_value: f64,
    pub records_count: usize,
    /// 1 for the highest mean.
    pub rank_by_mean: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub highest_mean: f64,
    pub lowest_mean: f64,
    pub states_count: usize,
}

/// Side-by-side statistics for a set of states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub states_compared: Vec<String>,
    pub metric: Metric,
    pub cancer_type: Option<String>,
    pub comparison_data: BTreeMap<String, StateStats>,
    pub summary: ComparisonSummary,
}

impl ComparisonResult {
    /// Returns the compared states ordered by rank.
    pub fn ranked(&self) -> Vec<(&String, &StateStats)> {
        let mut ranked: Vec<_> = self.comparison_data.iter().collect();
        ranked.sort_by_key(|(_, stats)| stats.rank_by_mean);
        ranked
    }
}

/// A single record flagged as an outlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub state: String,
    pub year: i32,
    pub cancer_type: String,
    pub value: f64,
    pub z_score: f64,
    /// Signed difference between the value and the dataset mean.
    pub deviation_from_mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierResult {
    pub outliers: Vec<Outlier>,
    pub total_outliers: usize,
    pub total_records: usize,
    pub threshold: f64,
    pub metric: Metric,
    pub dataset_mean: f64,
    pub dataset_std: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Correlation between two distinct metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub metric1: Metric,
    pub metric2: Metric,
    pub correlation: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Upper-triangle pairs keyed as `<metric1>_vs_<metric2>`.
    pub correlations: BTreeMap<String, CorrelationPair>,
    /// Full symmetric matrix keyed by metric column name.
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub total_records: usize,
}

impl CorrelationResult {
    /// Looks up a matrix cell.
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        self.correlation_matrix
            .get(a.as_str())
            .and_then(|row| row.get(b.as_str()))
            .copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearsRange {
    pub min_year: i32,
    pub max_year: i32,
}

/// A row of the `location` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub count: f64,
    pub avg_rate: f64,
}

/// Summary of every record for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state: String,
    pub total_records: usize,
    pub years_covered: YearsRange,
    pub cancer_types_count: usize,
    pub total_mortality: MetricTotals,
    pub total_incidence: MetricTotals,
}

/// Mean metric value per (state, year), states as rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    pub metric: Metric,
    pub cancer_type: Option<String>,
    pub states: Vec<String>,
    pub years: Vec<i32>,
    /// `values[i][j]` is the mean for `states[i]` in `years[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Result of a store connection check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatus {
    pub database: String,
    pub sqlite_version: String,
    pub records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, year: i32, cancer_type: &str) -> Record {
        Record {
            cancer_type: cancer_type.to_string(),
            year,
            sex: "Persons".to_string(),
            state: state.to_string(),
            mortality_count: 10,
            mortality_rate: 1.5,
            incidence_rate: 20.0,
            incidence_count: 100.0,
        }
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("mortality_rate".parse::<Metric>(), Ok(Metric::MortalityRate));
        assert_eq!("Incidence Count".parse::<Metric>(), Ok(Metric::IncidenceCount));
        assert_eq!("mortality-count".parse::<Metric>(), Ok(Metric::MortalityCount));
        assert!("population".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_serde_names() {
        let json = serde_json::to_string(&Metric::IncidenceRate).unwrap();
        assert_eq!(json, "\"incidence_rate\"");
        for metric in Metric::ALL {
            assert_eq!(metric.to_string(), metric.as_str());
        }
    }

    #[test]
    fn test_record_value() {
        let r = record("Victoria", 2020, "Lung cancer");
        assert_eq!(r.value(Metric::MortalityCount), 10.0);
        assert_eq!(r.value(Metric::MortalityRate), 1.5);
        assert_eq!(r.value(Metric::IncidenceRate), 20.0);
        assert_eq!(r.value(Metric::IncidenceCount), 100.0);
    }

    #[test]
    fn test_filter_matches() {
        let r = record("Victoria", 2020, "Lung cancer");

        assert!(DataFilter::new().matches(&r));
        assert!(DataFilter::new().with_state("Victoria").matches(&r));
        assert!(!DataFilter::new().with_state("Tasmania").matches(&r));
        assert!(DataFilter::new()
            .with_state("Victoria")
            .with_year(2020)
            .with_cancer_type("Lung cancer")
            .matches(&r));
        assert!(!DataFilter::new().with_year(2019).matches(&r));
        assert!(!DataFilter::new().with_cancer_type("Melanoma").matches(&r));
    }

    #[test]
    fn test_filter_from_parts() {
        let filter = DataFilter::from_parts(Some("Victoria"), None, Some("Melanoma"));
        assert_eq!(filter.state.as_deref(), Some("Victoria"));
        assert_eq!(filter.year, None);
        assert_eq!(filter.cancer_type.as_deref(), Some("Melanoma"));
        assert_eq!(DataFilter::from_parts(None, None, None), DataFilter::new());
    }

    #[test]
    fn test_comparison_ranked() {
        let stats = |mean: f64, rank: usize| StateStats {
            mean,
            median: mean,
            min: mean,
            max: mean,
            std: 0.0,
            latest_value: mean,
            records_count: 1,
            rank_by_mean: rank,
        };
        let result = ComparisonResult {
            states_compared: vec!["A".into(), "B".into()],
            metric: Metric::MortalityRate,
            cancer_type: None,
            comparison_data: [("A".to_string(), stats(1.0, 2)), ("B".to_string(), stats(5.0, 1))]
                .into_iter()
                .collect(),
            summary: ComparisonSummary::default(),
        };

        let ranked = result.ranked();
        assert_eq!(ranked[0].0, "B");
        assert_eq!(ranked[1].0, "A");
    }
}
