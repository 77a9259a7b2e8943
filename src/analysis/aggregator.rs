//! Record grouping and per-group aggregation.
//!
//! This module provides the grouping helpers the analytics operations
//! build on, plus the lookups and pivots served directly to callers.

use crate::error::{AnalyticsError, Result};
use crate::models::{
    HeatmapMatrix, Location, Metric, MetricTotals, Record, StateSummary, StateValue, YearValue,
    YearsRange,
};
use crate::stats;
use std::collections::{BTreeMap, BTreeSet};

/// Extract the values of one metric, in row order.
pub fn metric_values(records: &[Record], metric: Metric) -> Vec<f64> {
    records.iter().map(|r| r.value(metric)).collect()
}

/// Group metric values by year, ordered by year.
pub fn group_by_year(records: &[Record], metric: Metric) -> BTreeMap<i32, Vec<f64>> {
    let mut grouped: BTreeMap<i32, Vec<f64>> = BTreeMap::new();

    for record in records {
        grouped.entry(record.year).or_default().push(record.value(metric));
    }

    grouped
}

/// Group metric values by state, ordered by state name.
pub fn group_by_state(records: &[Record], metric: Metric) -> BTreeMap<String, Vec<f64>> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for record in records {
        grouped
            .entry(record.state.clone())
            .or_default()
            .push(record.value(metric));
    }

    grouped
}

/// Mean of a metric per year, ordered by year.
pub fn yearly_means(records: &[Record], metric: Metric) -> Vec<YearValue> {
    group_by_year(records, metric)
        .into_iter()
        .filter_map(|(year, values)| stats::mean(&values).map(|value| YearValue { year, value }))
        .collect()
}

/// Mean of a metric per state, ordered by state name.
pub fn state_means(records: &[Record], metric: Metric) -> Vec<StateValue> {
    group_by_state(records, metric)
        .into_iter()
        .filter_map(|(state, values)| stats::mean(&values).map(|value| StateValue { state, value }))
        .collect()
}

pub fn latest_year(records: &[Record]) -> Option<i32> {
    records.iter().map(|r| r.year).max()
}

pub fn years_range(records: &[Record]) -> Option<YearsRange> {
    let min_year = records.iter().map(|r| r.year).min()?;
    let max_year = latest_year(records)?;
    Some(YearsRange { min_year, max_year })
}

/// Rows whose year equals `year`.
pub fn rows_in_year(records: &[Record], year: i32) -> Vec<&Record> {
    records.iter().filter(|r| r.year == year).collect()
}

/// Sum of a metric per state over the rows of the latest year.
pub fn latest_state_totals(records: &[Record], metric: Metric) -> Vec<StateValue> {
    let Some(latest) = latest_year(records) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in rows_in_year(records, latest) {
        *totals.entry(record.state.as_str()).or_default() += record.value(metric);
    }

    totals
        .into_iter()
        .map(|(state, value)| StateValue {
            state: state.to_string(),
            value,
        })
        .collect()
}

/// Distinct values of a string column, sorted.
pub fn distinct<'a>(records: &'a [Record], column: impl Fn(&'a Record) -> &'a str) -> Vec<String> {
    records
        .iter()
        .map(column)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Unique states in first-seen order, numbered from 1.
pub fn first_seen_locations(records: &[Record]) -> Vec<Location> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        if !names.contains(&record.state.as_str()) {
            names.push(&record.state);
        }
    }

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Location {
            id: i as i64 + 1,
            name: name.to_string(),
        })
        .collect()
}

/// Summarize every record of one state.
pub fn summarize_state(state: &str, records: &[Record]) -> Result<StateSummary> {
    let years_covered = years_range(records).ok_or_else(|| {
        AnalyticsError::InsufficientData(format!("No data found for state: {}", state))
    })?;

    let mortality_rates = metric_values(records, Metric::MortalityRate);
    let incidence_rates = metric_values(records, Metric::IncidenceRate);

    Ok(StateSummary {
        state: state.to_string(),
        total_records: records.len(),
        years_covered,
        cancer_types_count: distinct(records, |r| r.cancer_type.as_str()).len(),
        total_mortality: MetricTotals {
            count: metric_values(records, Metric::MortalityCount).iter().sum(),
            avg_rate: stats::mean(&mortality_rates).unwrap_or(0.0),
        },
        total_incidence: MetricTotals {
            count: metric_values(records, Metric::IncidenceCount).iter().sum(),
            avg_rate: stats::mean(&incidence_rates).unwrap_or(0.0),
        },
    })
}

/// Pivot records into a state x year matrix of mean metric values.
pub fn heatmap(records: &[Record], metric: Metric, cancer_type: Option<&str>) -> HeatmapMatrix {
    let mut cells: BTreeMap<&str, BTreeMap<i32, Vec<f64>>> = BTreeMap::new();
    for record in records {
        cells
            .entry(record.state.as_str())
            .or_default()
            .entry(record.year)
            .or_default()
            .push(record.value(metric));
    }

    let states = distinct(records, |r| r.state.as_str());
    let years: Vec<i32> = records
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let values = states
        .iter()
        .map(|state| {
            let by_year = cells.get(state.as_str());
            years
                .iter()
                .map(|year| {
                    by_year
                        .and_then(|row| row.get(year))
                        .and_then(|v| stats::mean(v))
                })
                .collect()
        })
        .collect();

    HeatmapMatrix {
        metric,
        cancer_type: cancer_type.map(String::from),
        states,
        years,
        values,
    }
}
