//! Cached analytics operations over a data source.
//!
//! Each operation fetches its rows through [`DataService`], runs the pure
//! computation from the sibling modules and memoizes the result keyed on
//! the operation name and its arguments.

use crate::analysis::{comparison, correlation, outliers, ranking, trend};
use crate::cache::{CacheKey, ResultCache};
use crate::config::{AnalyticsConfig, CacheConfig};
use crate::error::Result;
use crate::models::{
    ComparisonResult, CorrelationResult, DataFilter, Metric, OutlierResult, StateValue,
    TrendResult,
};
use crate::source::{DataService, DataSource};
use std::time::Duration;
use tracing::{error, info};

/// Tunables for the analytics operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsSettings {
    pub trend_slope_threshold: f64,
    pub outlier_limit: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            trend_slope_threshold: trend::DEFAULT_SLOPE_THRESHOLD,
            outlier_limit: outliers::DEFAULT_LIMIT,
        }
    }
}

impl From<&AnalyticsConfig> for AnalyticsSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            trend_slope_threshold: config.trend_slope_threshold,
            outlier_limit: config.outlier_limit,
        }
    }
}

/// Lifetime and capacity applied to every per-operation cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Zero disables caching.
    pub max_entries: usize,
}

impl CachePolicy {
    pub fn disabled() -> Self {
        Self {
            ttl: Duration::ZERO,
            max_entries: 0,
        }
    }

    fn build<V: Clone>(&self) -> ResultCache<V> {
        ResultCache::new(self.ttl, self.max_entries)
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            ttl: Duration::from_secs(config.ttl_seconds),
            max_entries: config.max_entries,
        }
    }
}

/// The aggregation engine's public face.
pub struct AnalyticsService<S> {
    data: DataService<S>,
    settings: AnalyticsSettings,
    trends: ResultCache<TrendResult>,
    rankings: ResultCache<Vec<StateValue>>,
    comparisons: ResultCache<ComparisonResult>,
    outliers: ResultCache<OutlierResult>,
    correlations: ResultCache<CorrelationResult>,
}

impl<S: DataSource> AnalyticsService<S> {
    pub fn new(data: DataService<S>, settings: AnalyticsSettings, cache: CachePolicy) -> Self {
        Self {
            data,
            settings,
            trends: cache.build(),
            rankings: cache.build(),
            comparisons: cache.build(),
            outliers: cache.build(),
            correlations: cache.build(),
        }
    }

    pub fn data(&self) -> &DataService<S> {
        &self.data
    }

    /// Linear trend of `metric` over yearly means, optionally for one
    /// state and cancer type.
    pub fn calculate_trends(
        &self,
        state: Option<&str>,
        cancer_type: Option<&str>,
        metric: Metric,
    ) -> Result<TrendResult> {
        let key = CacheKey::new("calculate_trends", (state, cancer_type, metric));
        self.trends
            .get_or_try_insert_with(key, || {
                let rows = self
                    .data
                    .cancer_data(&DataFilter::from_parts(state, None, cancer_type))?;
                trend::calculate_trend(&rows, metric, self.settings.trend_slope_threshold)
            })
            .inspect_err(|e| error!("Error calculating trends: {}", e))
    }

    /// States ranked by mean `metric`, highest first.
    pub fn top_states(
        &self,
        metric: Metric,
        cancer_type: Option<&str>,
        year: Option<i32>,
        limit: usize,
    ) -> Result<Vec<StateValue>> {
        let key = CacheKey::new("top_states", (metric, cancer_type, year, limit));
        self.rankings
            .get_or_try_insert_with(key, || {
                let rows = self
                    .data
                    .cancer_data(&DataFilter::from_parts(None, year, cancer_type))?;
                Ok(ranking::top_states(&rows, metric, year, limit))
            })
            .inspect_err(|e| error!("Error getting top states: {}", e))
    }

    /// Summary statistics of `metric` for each requested state.
    pub fn compare_states(
        &self,
        states: &[String],
        metric: Metric,
        cancer_type: Option<&str>,
    ) -> Result<ComparisonResult> {
        let key = CacheKey::new("compare_states", (states, metric, cancer_type));
        self.comparisons
            .get_or_try_insert_with(key, || {
                let mut rows = Vec::new();
                // One fetch per state keeps each query on the state index
                for (i, state) in states.iter().enumerate() {
                    if states[..i].contains(state) {
                        continue;
                    }
                    let filter = DataFilter::from_parts(Some(state), None, cancer_type);
                    rows.extend(self.data.cancer_data(&filter)?);
                }
                comparison::compare_states(&rows, states, metric, cancer_type)
            })
            .inspect_err(|e| error!("Error comparing states: {}", e))
    }

    /// Z-score outliers of `metric` across the whole table.
    pub fn outliers(&self, metric: Metric, threshold: f64) -> Result<OutlierResult> {
        let limit = self.settings.outlier_limit;
        let key = CacheKey::new("outliers", (metric, threshold, limit));
        self.outliers
            .get_or_try_insert_with(key, || {
                let rows = self.data.cancer_data(&DataFilter::new())?;
                outliers::detect_outliers(&rows, metric, threshold, limit)
            })
            .inspect_err(|e| error!("Error detecting outliers: {}", e))
    }

    /// Pairwise correlation of all four metrics across the whole table.
    pub fn correlations(&self) -> Result<CorrelationResult> {
        self.correlations
            .get_or_try_insert_with(CacheKey::new("correlations", ()), || {
                let rows = self.data.cancer_data(&DataFilter::new())?;
                correlation::correlations(&rows)
            })
            .inspect_err(|e| error!("Error calculating correlations: {}", e))
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.trends.clear();
        self.rankings.clear();
        self.comparisons.clear();
        self.outliers.clear();
        self.correlations.clear();
        info!("Analytics cache cleared");
    }
}
