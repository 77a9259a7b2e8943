//! Multi-state comparison.

use crate::analysis::aggregator::{latest_year, metric_values, rows_in_year};
use crate::error::{AnalyticsError, Result};
use crate::models::{ComparisonResult, ComparisonSummary, Metric, Record, StateStats};
use crate::stats;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Summary statistics of `metric` over one state's rows.
///
/// Returns `None` for an empty subset. `rank_by_mean` is filled in later.
pub fn state_stats(records: &[Record], metric: Metric) -> Option<StateStats> {
    let values = metric_values(records, metric);
    let latest = latest_year(records)?;
    let latest_values: Vec<f64> = rows_in_year(records, latest)
        .into_iter()
        .map(|r| r.value(metric))
        .collect();

    Some(StateStats {
        mean: stats::mean(&values)?,
        median: stats::median(&values)?,
        min: stats::min(&values)?,
        max: stats::max(&values)?,
        std: stats::sample_std(&values).unwrap_or(0.0),
        latest_value: stats::mean(&latest_values)?,
        records_count: values.len(),
        rank_by_mean: 0,
    })
}

/// Compare `states` on `metric`, optionally restricted to one cancer type.
///
/// States with no rows are omitted. Present states are ranked by mean,
/// highest first; ties keep the order the states were requested in.
pub fn compare_states(
    records: &[Record],
    states: &[String],
    metric: Metric,
    cancer_type: Option<&str>,
) -> Result<ComparisonResult> {
    if states.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "No states provided for comparison".to_string(),
        ));
    }

    let mut present: Vec<(String, StateStats)> = Vec::new();
    for state in states {
        if present.iter().any(|(name, _)| name == state) {
            continue;
        }

        let subset: Vec<Record> = records
            .iter()
            .filter(|r| &r.state == state && cancer_type.map_or(true, |c| r.cancer_type == c))
            .cloned()
            .collect();

        if let Some(stats) = state_stats(&subset, metric) {
            present.push((state.clone(), stats));
        }
    }

    present.sort_by(|a, b| b.1.mean.partial_cmp(&a.1.mean).unwrap_or(Ordering::Equal));
    for (rank, (_, stats)) in present.iter_mut().enumerate() {
        stats.rank_by_mean = rank + 1;
    }

    let summary = ComparisonSummary {
        highest_mean: present.first().map_or(0.0, |(_, s)| s.mean),
        lowest_mean: present.last().map_or(0.0, |(_, s)| s.mean),
        states_count: present.len(),
    };

    Ok(ComparisonResult {
        states_compared: states.to_vec(),
        metric,
        cancer_type: cancer_type.map(String::from),
        comparison_data: present.into_iter().collect::<BTreeMap<_, _>>(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{approx, record, sample_table};

    fn names(states: &[&str]) -> Vec<String> {
        states.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compare_three_states() {
        let table = sample_table();
        let result = compare_states(
            &table,
            &names(&["Victoria", "Tasmania", "Queensland"]),
            Metric::MortalityRate,
            Some("Lung cancer"),
        )
        .unwrap();

        assert_eq!(result.summary.states_count, 3);
        let tas = &result.comparison_data["Tasmania"];
        assert_eq!(tas.rank_by_mean, 1);
        assert!(approx(tas.mean, 19.0));
        assert!(approx(tas.median, 19.0));
        assert!(approx(tas.min, 18.0));
        assert!(approx(tas.max, 20.0));
        assert!(approx(tas.std, 1.0));
        assert!(approx(tas.latest_value, 18.0));
        assert_eq!(tas.records_count, 3);

        assert_eq!(result.comparison_data["Queensland"].rank_by_mean, 2);
        assert_eq!(result.comparison_data["Victoria"].rank_by_mean, 3);
        assert!(approx(result.summary.highest_mean, 19.0));
        assert!(approx(result.summary.lowest_mean, 12.0));
        assert_eq!(result.cancer_type.as_deref(), Some("Lung cancer"));
    }

    #[test]
    fn test_ranks_are_permutation_by_descending_mean() {
        let table = sample_table();
        let result = compare_states(
            &table,
            &names(&["Queensland", "Victoria", "Tasmania"]),
            Metric::IncidenceRate,
            None,
        )
        .unwrap();

        let ranked = result.ranked();
        let ranks: Vec<usize> = ranked.iter().map(|(_, s)| s.rank_by_mean).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(ranked.windows(2).all(|w| w[0].1.mean >= w[1].1.mean));
    }

    #[test]
    fn test_empty_states_is_invalid() {
        let result = compare_states(&sample_table(), &[], Metric::MortalityRate, None);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_absent_state_is_omitted() {
        let table = sample_table();
        let result = compare_states(
            &table,
            &names(&["Victoria", "Atlantis"]),
            Metric::MortalityRate,
            None,
        )
        .unwrap();

        assert_eq!(result.summary.states_count, 1);
        assert!(!result.comparison_data.contains_key("Atlantis"));
        assert_eq!(result.states_compared, names(&["Victoria", "Atlantis"]));
    }

    #[test]
    fn test_no_state_present() {
        let result =
            compare_states(&sample_table(), &names(&["Atlantis"]), Metric::MortalityRate, None)
                .unwrap();
        assert!(result.comparison_data.is_empty());
        assert_eq!(result.summary, ComparisonSummary::default());
    }

    #[test]
    fn test_single_row_state_has_zero_std() {
        let table = vec![record("Victoria", 2020, "Lung cancer", 4.0)];
        let result =
            compare_states(&table, &names(&["Victoria"]), Metric::MortalityRate, None).unwrap();
        let vic = &result.comparison_data["Victoria"];
        assert_eq!(vic.std, 0.0);
        assert_eq!(vic.rank_by_mean, 1);
    }

    #[test]
    fn test_duplicate_states_counted_once() {
        let result = compare_states(
            &sample_table(),
            &names(&["Victoria", "Victoria"]),
            Metric::MortalityRate,
            None,
        )
        .unwrap();
        assert_eq!(result.summary.states_count, 1);
    }
}
