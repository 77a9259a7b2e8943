//! Pairwise correlation between the four metrics.

use crate::analysis::aggregator::metric_values;
use crate::error::{AnalyticsError, Result};
use crate::models::{CorrelationPair, CorrelationResult, Metric, Record};
use crate::stats;
use std::collections::BTreeMap;

/// Describe a correlation coefficient, e.g. "strong positive correlation".
pub fn interpret_correlation(r: f64) -> String {
    let strength = match r.abs() {
        a if a >= 0.8 => "very strong",
        a if a >= 0.6 => "strong",
        a if a >= 0.4 => "moderate",
        a if a >= 0.2 => "weak",
        _ => "very weak",
    };
    let direction = if r > 0.0 { "positive" } else { "negative" };

    format!("{} {} correlation", strength, direction)
}

/// Pearson correlation for every pair of metrics across all rows.
///
/// The matrix is symmetric with 1.0 on the diagonal. A metric with no
/// variation correlates 0.0 with every other metric.
pub fn correlations(records: &[Record]) -> Result<CorrelationResult> {
    if records.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "No data available".to_string(),
        ));
    }

    let columns: Vec<(Metric, Vec<f64>)> = Metric::ALL
        .iter()
        .map(|&m| (m, metric_values(records, m)))
        .collect();

    let mut matrix: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut pairs: BTreeMap<String, CorrelationPair> = BTreeMap::new();

    for (i, (m1, xs)) in columns.iter().enumerate() {
        for (j, (m2, ys)) in columns.iter().enumerate() {
            let r = if i == j {
                1.0
            } else {
                stats::pearson(xs, ys).unwrap_or(0.0)
            };

            matrix
                .entry(m1.as_str().to_string())
                .or_default()
                .insert(m2.as_str().to_string(), r);

            if i < j {
                pairs.insert(
                    format!("{}_vs_{}", m1, m2),
                    CorrelationPair {
                        metric1: *m1,
                        metric2: *m2,
                        correlation: r,
                        interpretation: interpret_correlation(r),
                    },
                );
            }
        }
    }

    Ok(CorrelationResult {
        correlations: pairs,
        correlation_matrix: matrix,
        total_records: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{approx, record, sample_table};

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(interpret_correlation(0.95), "very strong positive correlation");
        assert_eq!(interpret_correlation(-0.7), "strong negative correlation");
        assert_eq!(interpret_correlation(0.4), "moderate positive correlation");
        assert_eq!(interpret_correlation(-0.25), "weak negative correlation");
        assert_eq!(interpret_correlation(0.1), "very weak positive correlation");
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let result = correlations(&sample_table()).unwrap();

        for a in Metric::ALL {
            assert_eq!(result.get(a, a), Some(1.0));
            for b in Metric::ALL {
                let ab = result.get(a, b).unwrap();
                let ba = result.get(b, a).unwrap();
                assert!(approx(ab, ba));
            }
        }
    }

    #[test]
    fn test_upper_triangle_pairs_only() {
        let result = correlations(&sample_table()).unwrap();

        assert_eq!(result.correlations.len(), 6);
        assert!(result
            .correlations
            .contains_key("mortality_count_vs_mortality_rate"));
        assert!(!result
            .correlations
            .contains_key("mortality_rate_vs_mortality_count"));
        assert_eq!(result.total_records, 18);
    }

    #[test]
    fn test_linearly_related_metrics() {
        // fixture derives incidence_rate = 2 * mortality_rate
        let result = correlations(&sample_table()).unwrap();
        let pair = &result.correlations["mortality_rate_vs_incidence_rate"];

        assert!(approx(pair.correlation, 1.0));
        assert_eq!(pair.interpretation, "very strong positive correlation");
    }

    #[test]
    fn test_constant_metric_correlates_zero() {
        let mut table = vec![
            record("A", 2019, "Lung cancer", 1.0),
            record("B", 2019, "Lung cancer", 2.0),
            record("C", 2019, "Lung cancer", 3.0),
        ];
        for r in &mut table {
            r.incidence_count = 5.0;
        }

        let result = correlations(&table).unwrap();
        assert_eq!(
            result.get(Metric::IncidenceCount, Metric::MortalityRate),
            Some(0.0)
        );
        assert_eq!(result.get(Metric::IncidenceCount, Metric::IncidenceCount), Some(1.0));
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        assert!(matches!(
            correlations(&[]),
            Err(AnalyticsError::InsufficientData(_))
        ));
    }
}
