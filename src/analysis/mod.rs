//! Aggregation engine.
//!
//! The computation modules are pure functions of a table and parameters;
//! [`service::AnalyticsService`] wires them to a data source and a cache.

pub mod aggregator;
pub mod comparison;
pub mod correlation;
pub mod outliers;
pub mod ranking;
pub mod service;
pub mod trend;

pub use service::{AnalyticsService, AnalyticsSettings, CachePolicy};
