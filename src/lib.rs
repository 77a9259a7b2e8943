//! CancerScope - cancer incidence and mortality analytics.
//!
//! The aggregation engine lives in [`analysis`]: pure functions over a
//! [`models::Table`] for trends, top-N rankings, state comparisons, z-score
//! outliers and metric correlations, plus [`analysis::AnalyticsService`]
//! which fetches rows from a [`source::DataSource`] and caches results.
//! The `cancerscope` binary wraps it in a CLI.

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod source;
pub mod stats;

#[cfg(test)]
mod fixtures;

pub use error::{AnalyticsError, ApiResponse, Result, SourceError};
pub use models::{DataFilter, Metric, Record, Table};
