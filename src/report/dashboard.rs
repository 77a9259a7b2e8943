//! Combined dashboard report.

use crate::analysis::AnalyticsService;
use crate::error::ApiResponse;
use crate::models::{
    CorrelationResult, Metric, OutlierResult, StateValue, TrendResult, YearsRange,
};
use crate::report::generator::render_response;
use crate::source::DataSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Parameters for the dashboard sections.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub database: String,
    pub metric: Metric,
    pub top_limit: usize,
    pub outlier_threshold: f64,
}

/// Every dashboard section, each carrying its own success or error.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub database: String,
    pub metric: Metric,
    pub states: ApiResponse<Vec<String>>,
    pub cancer_types: ApiResponse<Vec<String>>,
    pub years: ApiResponse<YearsRange>,
    pub overall_trend: ApiResponse<TrendResult>,
    pub top_states: ApiResponse<Vec<StateValue>>,
    pub correlations: ApiResponse<CorrelationResult>,
    pub outliers: ApiResponse<OutlierResult>,
}

impl Dashboard {
    /// Run every section against `service`. Section failures are kept in
    /// the section, not propagated.
    pub fn build<S: DataSource>(service: &AnalyticsService<S>, options: &DashboardOptions) -> Self {
        let data = service.data();
        let dashboard = Self {
            generated_at: Utc::now(),
            database: options.database.clone(),
            metric: options.metric,
            states: data.states().into(),
            cancer_types: data.cancer_types().into(),
            years: data.years_range().into(),
            overall_trend: service.calculate_trends(None, None, options.metric).into(),
            top_states: service
                .top_states(options.metric, None, None, options.top_limit)
                .into(),
            correlations: service.correlations().into(),
            outliers: service
                .outliers(options.metric, options.outlier_threshold)
                .into(),
        };

        let failed = dashboard.failed_sections();
        if failed > 0 {
            warn!("{} dashboard sections failed", failed);
        }
        dashboard
    }

    /// Number of sections holding an error payload.
    pub fn failed_sections(&self) -> usize {
        [
            self.states.is_success(),
            self.cancer_types.is_success(),
            self.years.is_success(),
            self.overall_trend.is_success(),
            self.top_states.is_success(),
            self.correlations.is_success(),
            self.outliers.is_success(),
        ]
        .iter()
        .filter(|ok| !**ok)
        .count()
    }
}

/// Generate the dashboard as a Markdown document.
pub fn generate_dashboard_markdown(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str("# CancerScope Dashboard\n\n");
    output.push_str(&generate_metadata_section(dashboard));
    output.push_str(&generate_table_of_contents());

    output.push_str("## Overview\n\n### States\n\n");
    output.push_str(&render_response(&dashboard.states));
    output.push_str("### Cancer Types\n\n");
    output.push_str(&render_response(&dashboard.cancer_types));
    output.push_str("### Years\n\n");
    output.push_str(&render_response(&dashboard.years));

    output.push_str("## Overall Trend\n\n");
    output.push_str(&render_response(&dashboard.overall_trend));

    output.push_str("## Top States\n\n");
    output.push_str(&render_response(&dashboard.top_states));

    output.push_str("## Correlations\n\n");
    output.push_str(&render_response(&dashboard.correlations));

    output.push_str("## Outliers\n\n");
    output.push_str(&render_response(&dashboard.outliers));

    output.push_str(&generate_footer());
    output
}

fn generate_metadata_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Database:** `{}`\n", dashboard.database));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Metric:** {}\n", dashboard.metric.label()));
    if let Some(total) = dashboard.correlations.data.as_ref().map(|c| c.total_records) {
        section.push_str(&format!("- **Records:** {}\n", total));
    }
    let failed = dashboard.failed_sections();
    if failed > 0 {
        section.push_str(&format!("- **Failed Sections:** {}\n", failed));
    }
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in [
        ("Metadata", "metadata"),
        ("Overview", "overview"),
        ("Overall Trend", "overall-trend"),
        ("Top States", "top-states"),
        ("Correlations", "correlations"),
        ("Outliers", "outliers"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by CancerScope v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}
