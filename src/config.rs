//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cancerscope.toml` files.

use crate::cli::OutputFormat;
use crate::models::Metric;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".cancerscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record store locations.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Defaults and thresholds for the analytics operations.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// CSV file ingested by `load`.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            csv_path: default_csv_path(),
        }
    }
}

fn default_db_path() -> String {
    "cancer_data.db".to_string()
}

fn default_csv_path() -> String {
    "data/incidence_mortality_state.csv".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lifetime of a cached result.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Entries kept per operation before the oldest is evicted.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u64 {
    600 // 10 min
}

fn default_max_entries() -> usize {
    256
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Metric used when a command does not name one.
    #[serde(default)]
    pub default_metric: Metric,

    /// Slope magnitude separating stable from increasing/decreasing.
    #[serde(default = "default_slope_threshold")]
    pub trend_slope_threshold: f64,

    /// Z-score above which a row is an outlier.
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,

    /// Maximum outliers listed.
    #[serde(default = "default_outlier_limit")]
    pub outlier_limit: usize,

    /// Default number of states in a top-N ranking.
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,

    /// State column value of the national aggregate rows.
    #[serde(default = "default_national_label")]
    pub national_label: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_metric: Metric::default(),
            trend_slope_threshold: default_slope_threshold(),
            outlier_threshold: default_outlier_threshold(),
            outlier_limit: default_outlier_limit(),
            top_limit: default_top_limit(),
            national_label: default_national_label(),
        }
    }
}

fn default_slope_threshold() -> f64 {
    crate::analysis::trend::DEFAULT_SLOPE_THRESHOLD
}

fn default_outlier_threshold() -> f64 {
    crate::analysis::outliers::DEFAULT_THRESHOLD
}

fn default_outlier_limit() -> usize {
    crate::analysis::outliers::DEFAULT_LIMIT
}

fn default_top_limit() -> usize {
    crate::analysis::ranking::DEFAULT_LIMIT
}

fn default_national_label() -> String {
    "Australia".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user passed explicitly override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref db) = args.db {
            self.database.path = db.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet {
            self.general.verbose = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, "cancer_data.db");
        assert_eq!(config.analytics.default_metric, Metric::MortalityRate);
        assert_eq!(config.analytics.outlier_limit, 20);
        assert_eq!(config.analytics.top_limit, 10);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "json"

[database]
path = "/tmp/other.db"

[cache]
enabled = false

[analytics]
default_metric = "incidence_rate"
outlier_threshold = 3.0
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.database.path, "/tmp/other.db");
        assert_eq!(config.database.csv_path, "data/incidence_mortality_state.csv");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 600);
        assert_eq!(config.analytics.default_metric, Metric::IncidenceRate);
        assert_eq!(config.analytics.outlier_threshold, 3.0);
        assert_eq!(config.analytics.national_label, "Australia");
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[analytics]\ndefault_metric = \"survival_rate\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = crate::cli::Args::parse_from([
            "cancerscope",
            "--db",
            "other.db",
            "--format",
            "json",
            "states",
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.database.path, "other.db");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_quiet_overrides_verbose_config() {
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = crate::cli::Args::parse_from(["cancerscope", "states"]);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        let mut quiet = config.clone();
        quiet.merge_with_args(&crate::cli::Args::parse_from(["cancerscope", "--quiet", "states"]));
        assert!(!quiet.general.verbose);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[analytics]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.cache.max_entries, 256);
    }
}
