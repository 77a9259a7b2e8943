//! Z-score outlier detection.

use crate::analysis::aggregator::metric_values;
use crate::error::{AnalyticsError, Result};
use crate::models::{Metric, Outlier, OutlierResult, Record};
use crate::stats;
use std::cmp::Ordering;

pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Maximum number of outliers listed in a result.
pub const DEFAULT_LIMIT: usize = 20;

/// Flag rows whose `|value - mean| / std` exceeds `threshold`.
///
/// Uses the population mean and standard deviation over every row. The
/// returned list is sorted by descending z-score and truncated to `limit`;
/// `total_outliers` counts every flagged row.
pub fn detect_outliers(
    records: &[Record],
    metric: Metric,
    threshold: f64,
    limit: usize,
) -> Result<OutlierResult> {
    let values = metric_values(records, metric);
    let (Some(mean), Some(std)) = (stats::mean(&values), stats::population_std(&values)) else {
        return Err(AnalyticsError::InsufficientData(
            "No data available".to_string(),
        ));
    };

    let mut result = OutlierResult {
        outliers: Vec::new(),
        total_outliers: 0,
        total_records: records.len(),
        threshold,
        metric,
        dataset_mean: mean,
        dataset_std: std,
        note: None,
    };

    if stats::is_constant(&values) {
        result.dataset_std = 0.0;
        result.note = Some(AnalyticsError::NoVariation.to_string());
        return Ok(result);
    }

    let mut flagged: Vec<Outlier> = records
        .iter()
        .zip(&values)
        .filter_map(|(record, &value)| {
            let z_score = (value - mean).abs() / std;
            (z_score > threshold).then(|| Outlier {
                state: record.state.clone(),
                year: record.year,
                cancer_type: record.cancer_type.clone(),
                value,
                z_score,
                deviation_from_mean: value - mean,
            })
        })
        .collect();

    flagged.sort_by(|a, b| b.z_score.partial_cmp(&a.z_score).unwrap_or(Ordering::Equal));

    result.total_outliers = flagged.len();
    flagged.truncate(limit);
    result.outliers = flagged;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{approx, record_with};

    fn spiked_table() -> Vec<Record> {
        let mut table: Vec<Record> = (0..20)
            .map(|i| record_with("Victoria", 2000 + i, Metric::MortalityRate, 10.0))
            .collect();
        table.push(record_with("Tasmania", 2020, Metric::MortalityRate, 50.0));
        table.push(record_with("Queensland", 2020, Metric::MortalityRate, -30.0));
        table
    }

    #[test]
    fn test_detects_spikes_both_directions() {
        let table = spiked_table();
        let result = detect_outliers(&table, Metric::MortalityRate, DEFAULT_THRESHOLD, DEFAULT_LIMIT)
            .unwrap();

        assert_eq!(result.total_records, 22);
        assert_eq!(result.total_outliers, 2);
        assert!(approx(result.dataset_mean, 10.0));

        let tas = result.outliers.iter().find(|o| o.state == "Tasmania").unwrap();
        assert!(approx(tas.deviation_from_mean, 40.0));
        let qld = result.outliers.iter().find(|o| o.state == "Queensland").unwrap();
        assert!(approx(qld.deviation_from_mean, -40.0));
        assert!(qld.z_score > 0.0);
    }

    #[test]
    fn test_sorted_and_limited() {
        let mut table: Vec<Record> = (0..200)
            .map(|i| record_with("Victoria", 1900 + i, Metric::IncidenceRate, 0.0))
            .collect();
        for i in 0..30 {
            table.push(record_with("Tasmania", 2000 + i, Metric::IncidenceRate, 100.0 + i as f64));
        }

        let result = detect_outliers(&table, Metric::IncidenceRate, 1.0, DEFAULT_LIMIT).unwrap();

        assert_eq!(result.total_outliers, 30);
        assert_eq!(result.outliers.len(), 20);
        assert!(result
            .outliers
            .windows(2)
            .all(|w| w[0].z_score >= w[1].z_score));
        assert!(approx(result.outliers[0].value, 129.0));
    }

    #[test]
    fn test_no_variation_returns_note() {
        let table: Vec<Record> = (0..5)
            .map(|i| record_with("Victoria", 2015 + i, Metric::MortalityRate, 7.0))
            .collect();

        let result = detect_outliers(&table, Metric::MortalityRate, DEFAULT_THRESHOLD, DEFAULT_LIMIT)
            .unwrap();

        assert!(result.outliers.is_empty());
        assert_eq!(result.total_records, 5);
        assert_eq!(result.note.as_deref(), Some("No variation in data"));
    }

    #[test]
    fn test_constant_decimal_values_have_no_variation() {
        for value in [0.1, 12.3] {
            for threshold in [DEFAULT_THRESHOLD, 0.5] {
                let table: Vec<Record> = (0..3)
                    .map(|i| record_with("Victoria", 2018 + i, Metric::MortalityRate, value))
                    .collect();

                let result =
                    detect_outliers(&table, Metric::MortalityRate, threshold, DEFAULT_LIMIT).unwrap();

                assert_eq!(result.total_outliers, 0);
                assert!(result.outliers.is_empty());
                assert_eq!(result.dataset_std, 0.0);
                assert_eq!(result.note.as_deref(), Some("No variation in data"));
            }
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // values 0 and 2: mean 1, std 1, both z-scores exactly 1
        let table = vec![
            record_with("A", 2019, Metric::MortalityRate, 0.0),
            record_with("B", 2019, Metric::MortalityRate, 2.0),
        ];
        let result = detect_outliers(&table, Metric::MortalityRate, 1.0, DEFAULT_LIMIT).unwrap();
        assert_eq!(result.total_outliers, 0);
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let result = detect_outliers(&[], Metric::MortalityRate, DEFAULT_THRESHOLD, DEFAULT_LIMIT);
        assert!(matches!(result, Err(AnalyticsError::InsufficientData(_))));
    }
}
