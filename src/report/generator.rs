//! Markdown and JSON rendering of operation results.
//!
//! Every result type renders its own body through [`RenderMarkdown`];
//! [`generate_markdown`] wraps a response with a title and turns an error
//! payload into an error line.

use crate::error::ApiResponse;
use crate::loader::LoadSummary;
use crate::models::{
    ComparisonResult, CorrelationResult, HeatmapMatrix, Location, Metric, OutlierResult, Record,
    StateSummary, StateValue, StoreStatus, TrendResult, YearValue, YearsRange,
};
use anyhow::Result;
use serde::Serialize;

/// Markdown body of a result, without a heading.
pub trait RenderMarkdown {
    fn render_markdown(&self) -> String;
}

/// Format a float for a report cell.
fn num(value: f64) -> String {
    format!("{:.2}", value)
}

/// Generate a titled Markdown document for one response.
pub fn generate_markdown<T: RenderMarkdown>(title: &str, response: &ApiResponse<T>) -> String {
    let mut output = format!("# {}\n\n", title);
    output.push_str(&render_response(response));
    output
}

/// Body of a response: the rendered data or an error line.
pub fn render_response<T: RenderMarkdown>(response: &ApiResponse<T>) -> String {
    match (&response.data, &response.error) {
        (Some(data), _) => data.render_markdown(),
        (None, Some(error)) => format!("❌ **Error:** {}\n\n", error),
        (None, None) => "No data.\n\n".to_string(),
    }
}

/// Generate a JSON document for one response.
pub fn generate_json<T: Serialize>(response: &ApiResponse<T>) -> Result<String> {
    serde_json::to_string_pretty(response).map_err(Into::into)
}

impl RenderMarkdown for Vec<String> {
    fn render_markdown(&self) -> String {
        if self.is_empty() {
            return "No entries.\n\n".to_string();
        }
        let mut body: String = self.iter().map(|item| format!("- {}\n", item)).collect();
        body.push_str(&format!("\n*{} entries*\n\n", self.len()));
        body
    }
}

impl RenderMarkdown for YearsRange {
    fn render_markdown(&self) -> String {
        format!(
            "- **First Year:** {}\n- **Last Year:** {}\n\n",
            self.min_year, self.max_year
        )
    }
}

impl RenderMarkdown for Vec<Location> {
    fn render_markdown(&self) -> String {
        let mut body = String::from("| ID | Name |\n|:---:|:---|\n");
        for loc in self {
            body.push_str(&format!("| {} | {} |\n", loc.id, loc.name));
        }
        body.push('\n');
        body
    }
}

impl RenderMarkdown for Vec<Record> {
    fn render_markdown(&self) -> String {
        if self.is_empty() {
            return "No records match the filters.\n\n".to_string();
        }

        let mut body = String::from(
            "| Year | State | Cancer Type | Sex | Mortality Count | Mortality Rate | Incidence Rate | Incidence Count |\n\
             |:---:|:---|:---|:---|---:|---:|---:|---:|\n",
        );
        for r in self {
            body.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                r.year,
                r.state,
                r.cancer_type,
                r.sex,
                r.mortality_count,
                num(r.mortality_rate),
                num(r.incidence_rate),
                num(r.incidence_count)
            ));
        }
        body.push_str(&format!("\n*{} records*\n\n", self.len()));
        body
    }
}

impl RenderMarkdown for StateSummary {
    fn render_markdown(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!("- **State:** {}\n", self.state));
        body.push_str(&format!("- **Records:** {}\n", self.total_records));
        body.push_str(&format!(
            "- **Years Covered:** {}-{}\n",
            self.years_covered.min_year, self.years_covered.max_year
        ));
        body.push_str(&format!("- **Cancer Types:** {}\n\n", self.cancer_types_count));

        body.push_str("| Measure | Total Count | Average Rate |\n|:---|---:|---:|\n");
        body.push_str(&format!(
            "| Mortality | {} | {} |\n",
            num(self.total_mortality.count),
            num(self.total_mortality.avg_rate)
        ));
        body.push_str(&format!(
            "| Incidence | {} | {} |\n\n",
            num(self.total_incidence.count),
            num(self.total_incidence.avg_rate)
        ));
        body
    }
}

impl RenderMarkdown for Vec<YearValue> {
    fn render_markdown(&self) -> String {
        let mut body = String::from("| Year | Value |\n|:---:|---:|\n");
        for yv in self {
            body.push_str(&format!("| {} | {} |\n", yv.year, num(yv.value)));
        }
        body.push('\n');
        body
    }
}

impl RenderMarkdown for TrendResult {
    fn render_markdown(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!(
            "**{} {}** ({})\n\n",
            self.trend_direction.arrow(),
            self.trend_direction,
            self.metric.label()
        ));
        body.push_str("| Measure | Value |\n|:---|---:|\n");
        body.push_str(&format!("| Slope per year | {:.4} |\n", self.slope));
        body.push_str(&format!("| Intercept | {} |\n", num(self.intercept)));
        body.push_str(&format!("| Correlation (r) | {:.4} |\n", self.correlation));
        body.push_str(&format!("| Percent change | {}% |\n", num(self.percent_change)));
        body.push_str(&format!(
            "| {} value | {} |\n",
            self.first_year,
            num(self.first_value)
        ));
        body.push_str(&format!(
            "| {} value | {} |\n",
            self.last_year,
            num(self.last_value)
        ));
        body.push_str(&format!("| Mean | {} |\n", num(self.mean_value)));
        body.push_str(&format!("| Std deviation | {} |\n", num(self.std_value)));
        body.push_str(&format!("| Years analyzed | {} |\n\n", self.years_analyzed));
        body
    }
}

impl RenderMarkdown for Vec<StateValue> {
    fn render_markdown(&self) -> String {
        if self.is_empty() {
            return "No states to rank.\n\n".to_string();
        }

        let mut body = String::from("| Rank | State | Value |\n|:---:|:---|---:|\n");
        for (i, sv) in self.iter().enumerate() {
            body.push_str(&format!("| {} | {} | {} |\n", i + 1, sv.state, num(sv.value)));
        }
        body.push('\n');
        body
    }
}

impl RenderMarkdown for ComparisonResult {
    fn render_markdown(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!("- **Metric:** {}\n", self.metric.label()));
        if let Some(ref cancer_type) = self.cancer_type {
            body.push_str(&format!("- **Cancer Type:** {}\n", cancer_type));
        }
        body.push_str(&format!(
            "- **States Requested:** {}\n",
            self.states_compared.join(", ")
        ));
        body.push_str(&format!(
            "- **States With Data:** {}\n\n",
            self.summary.states_count
        ));

        if self.comparison_data.is_empty() {
            body.push_str("None of the requested states have data.\n\n");
            return body;
        }

        body.push_str(
            "| Rank | State | Mean | Median | Min | Max | Std | Latest | Records |\n\
             |:---:|:---|---:|---:|---:|---:|---:|---:|:---:|\n",
        );
        for (state, s) in self.ranked() {
            body.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                s.rank_by_mean,
                state,
                num(s.mean),
                num(s.median),
                num(s.min),
                num(s.max),
                num(s.std),
                num(s.latest_value),
                s.records_count
            ));
        }
        body.push_str(&format!(
            "\nHighest mean {}, lowest mean {}.\n\n",
            num(self.summary.highest_mean),
            num(self.summary.lowest_mean)
        ));
        body
    }
}

impl RenderMarkdown for OutlierResult {
    fn render_markdown(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!("- **Metric:** {}\n", self.metric.label()));
        body.push_str(&format!("- **Z-score Threshold:** {}\n", self.threshold));
        body.push_str(&format!(
            "- **Dataset Mean:** {} (std {})\n",
            num(self.dataset_mean),
            num(self.dataset_std)
        ));
        body.push_str(&format!(
            "- **Outliers:** {} of {} records\n\n",
            self.total_outliers, self.total_records
        ));

        if let Some(ref note) = self.note {
            body.push_str(&format!("> ⚠️ {}\n\n", note));
        }
        if self.outliers.is_empty() {
            return body;
        }

        body.push_str(
            "| State | Year | Cancer Type | Value | Z-score | Deviation |\n\
             |:---|:---:|:---|---:|---:|---:|\n",
        );
        for o in &self.outliers {
            body.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:+.2} |\n",
                o.state,
                o.year,
                o.cancer_type,
                num(o.value),
                num(o.z_score),
                o.deviation_from_mean
            ));
        }
        if self.total_outliers > self.outliers.len() {
            body.push_str(&format!(
                "\n*Showing the top {} by z-score.*\n",
                self.outliers.len()
            ));
        }
        body.push('\n');
        body
    }
}

impl RenderMarkdown for CorrelationResult {
    fn render_markdown(&self) -> String {
        let mut body = String::new();

        body.push_str("| Pair | r | Interpretation |\n|:---|---:|:---|\n");
        for pair in self.correlations.values() {
            body.push_str(&format!(
                "| {} / {} | {:.3} | {} |\n",
                pair.metric1.label(),
                pair.metric2.label(),
                pair.correlation,
                pair.interpretation
            ));
        }

        body.push_str("\n### Correlation Matrix\n\n|  |");
        for m in Metric::ALL {
            body.push_str(&format!(" {} |", m.label()));
        }
        body.push_str("\n|:---|");
        body.push_str(&"---:|".repeat(Metric::ALL.len()));
        body.push('\n');
        for row in Metric::ALL {
            body.push_str(&format!("| **{}** |", row.label()));
            for col in Metric::ALL {
                let cell = self
                    .get(row, col)
                    .map_or_else(|| "-".to_string(), |r| format!("{:.3}", r));
                body.push_str(&format!(" {} |", cell));
            }
            body.push('\n');
        }
        body.push_str(&format!("\n*{} records*\n\n", self.total_records));
        body
    }
}

impl RenderMarkdown for HeatmapMatrix {
    fn render_markdown(&self) -> String {
        let mut body = format!(
            "- **Metric:** {}\n- **Cancer Type:** {}\n\n",
            self.metric.label(),
            self.cancer_type.as_deref().unwrap_or("All")
        );

        body.push_str("| State |");
        for year in &self.years {
            body.push_str(&format!(" {} |", year));
        }
        body.push_str("\n|:---|");
        body.push_str(&"---:|".repeat(self.years.len()));
        body.push('\n');

        for (state, row) in self.states.iter().zip(&self.values) {
            body.push_str(&format!("| {} |", state));
            for cell in row {
                let text = cell.map_or_else(|| "-".to_string(), num);
                body.push_str(&format!(" {} |", text));
            }
            body.push('\n');
        }
        body.push('\n');
        body
    }
}

impl RenderMarkdown for LoadSummary {
    fn render_markdown(&self) -> String {
        format!(
            "- **Rows Read:** {}\n- **Rows Loaded:** {}\n- **Rows Skipped:** {}\n- **Locations:** {}\n\n",
            self.rows_read, self.rows_loaded, self.rows_skipped, self.locations
        )
    }
}

impl RenderMarkdown for StoreStatus {
    fn render_markdown(&self) -> String {
        format!(
            "- **Database:** `{}`\n- **SQLite Version:** {}\n- **Records:** {}\n\n",
            self.database, self.sqlite_version, self.records
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{comparison, correlation, outliers, trend};
    use crate::fixtures::{record, sample_table};
    use crate::models::TrendDirection;

    #[test]
    fn test_error_payload_rendering() {
        let response: ApiResponse<TrendResult> = ApiResponse::error("Insufficient data: x");
        let markdown = generate_markdown("Trend", &response);

        assert!(markdown.starts_with("# Trend\n"));
        assert!(markdown.contains("**Error:** Insufficient data: x"));
    }

    #[test]
    fn test_trend_rendering() {
        let table = vec![
            record("A", 2018, "Lung cancer", 10.0),
            record("A", 2019, "Lung cancer", 20.0),
        ];
        let result = trend::calculate_trend(&table, Metric::MortalityRate, 0.1).unwrap();
        assert_eq!(result.trend_direction, TrendDirection::Increasing);

        let body = result.render_markdown();
        assert!(body.contains("↑ increasing"));
        assert!(body.contains("| Percent change | 100.00% |"));
    }

    #[test]
    fn test_ranking_rendering() {
        let ranking = vec![
            StateValue {
                state: "Tasmania".to_string(),
                value: 18.0,
            },
            StateValue {
                state: "Victoria".to_string(),
                value: 14.5,
            },
        ];
        let body = ranking.render_markdown();
        assert!(body.contains("| 1 | Tasmania | 18.00 |"));
        assert!(body.contains("| 2 | Victoria | 14.50 |"));
        assert!(Vec::<StateValue>::new().render_markdown().contains("No states"));
    }

    #[test]
    fn test_comparison_rendering_in_rank_order() {
        let states = vec!["Victoria".to_string(), "Tasmania".to_string()];
        let result =
            comparison::compare_states(&sample_table(), &states, Metric::MortalityRate, None)
                .unwrap();

        let body = result.render_markdown();
        let tas = body.find("| 1 | Tasmania").unwrap();
        let vic = body.find("| 2 | Victoria").unwrap();
        assert!(tas < vic);
    }

    #[test]
    fn test_outlier_note_rendering() {
        let table = vec![
            record("A", 2018, "Lung cancer", 5.0),
            record("B", 2018, "Lung cancer", 5.0),
        ];
        let result = outliers::detect_outliers(&table, Metric::MortalityRate, 2.0, 20).unwrap();
        let body = result.render_markdown();

        assert!(body.contains("No variation in data"));
        assert!(!body.contains("| State |"));
    }

    #[test]
    fn test_correlation_matrix_rendering() {
        let result = correlation::correlations(&sample_table()).unwrap();
        let body = result.render_markdown();

        assert!(body.contains("### Correlation Matrix"));
        assert!(body.contains("| **Mortality Rate** |"));
        assert!(body.contains("1.000"));
    }

    #[test]
    fn test_generate_json() {
        let response = ApiResponse::ok(vec!["Victoria".to_string()]);
        let json = generate_json(&response).unwrap();

        assert!(json.contains("\"success\": true"));
        assert!(json.contains("\"Victoria\""));
        assert!(!json.contains("\"error\""));
    }
}
