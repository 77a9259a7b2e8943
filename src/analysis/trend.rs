//! Linear trend over yearly means.

use crate::analysis::aggregator::yearly_means;
use crate::error::{AnalyticsError, Result};
use crate::models::{Metric, Record, TrendDirection, TrendResult};
use crate::stats;

/// Slope magnitude above which a trend counts as increasing or decreasing.
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 0.1;

/// Classify a slope: above `threshold` is increasing, below `-threshold`
/// is decreasing, anything in between is stable.
pub fn classify_direction(slope: f64, threshold: f64) -> TrendDirection {
    if slope > threshold {
        TrendDirection::Increasing
    } else if slope < -threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Percentage change from `first` to `last`. Fails on a zero baseline.
pub fn percent_change(first: f64, last: f64) -> Result<f64> {
    if first == 0.0 {
        return Err(AnalyticsError::DivisionByZero(
            "first year value is 0, percent change is undefined".to_string(),
        ));
    }
    Ok((last - first) / first * 100.0)
}

/// Fit a trend line through the yearly means of `metric`.
///
/// Requires at least two distinct years.
pub fn calculate_trend(
    records: &[Record],
    metric: Metric,
    slope_threshold: f64,
) -> Result<TrendResult> {
    if records.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "No data available".to_string(),
        ));
    }

    let yearly = yearly_means(records, metric);
    if yearly.len() < 2 {
        return Err(AnalyticsError::InsufficientData(format!(
            "trend analysis needs at least 2 distinct years, found {}",
            yearly.len()
        )));
    }

    let xs: Vec<f64> = yearly.iter().map(|yv| yv.year as f64).collect();
    let ys: Vec<f64> = yearly.iter().map(|yv| yv.value).collect();

    let fit = stats::linear_fit(&xs, &ys)
        .ok_or_else(|| AnalyticsError::Computation("least-squares fit failed".to_string()))?;
    // Flat series have no defined correlation with time
    let correlation = stats::pearson(&xs, &ys).unwrap_or(0.0);

    let first = yearly[0];
    let last = yearly[yearly.len() - 1];

    Ok(TrendResult {
        metric,
        trend_direction: classify_direction(fit.slope, slope_threshold),
        slope: fit.slope,
        intercept: fit.intercept,
        correlation,
        percent_change: percent_change(first.value, last.value)?,
        years_analyzed: yearly.len(),
        first_year: first.year,
        last_year: last.year,
        first_value: first.value,
        last_value: last.value,
        mean_value: stats::mean(&ys).unwrap_or(0.0),
        std_value: stats::population_std(&ys).unwrap_or(0.0),
    })
}
