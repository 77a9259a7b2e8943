//! Report rendering.

pub mod dashboard;
pub mod generator;

pub use dashboard::{generate_dashboard_markdown, Dashboard, DashboardOptions};
pub use generator::{generate_json, generate_markdown, RenderMarkdown};
