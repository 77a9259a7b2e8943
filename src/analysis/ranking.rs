//! Top-N state rankings.

use crate::analysis::aggregator::{latest_year, state_means};
use crate::models::{Metric, Record, StateValue};
use std::cmp::Ordering;

/// Default number of states returned by [`top_states`].
pub const DEFAULT_LIMIT: usize = 10;

/// Rank states by the mean of `metric`, highest first.
///
/// When `year` is `None` only rows from the latest year present are used.
/// States with equal means keep alphabetical order. An empty table gives
/// an empty ranking.
pub fn top_states(
    records: &[Record],
    metric: Metric,
    year: Option<i32>,
    limit: usize,
) -> Vec<StateValue> {
    let Some(year) = year.or_else(|| latest_year(records)) else {
        return Vec::new();
    };

    let rows: Vec<Record> = records.iter().filter(|r| r.year == year).cloned().collect();

    let mut ranked = state_means(&rows, metric);
    // sort_by is stable, so ties keep the alphabetical grouping order
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}
