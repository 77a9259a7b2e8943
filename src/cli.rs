//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Metric;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CancerScope - cancer incidence and mortality analytics
///
/// Load state-level cancer statistics into SQLite and compute trends,
/// rankings, comparisons, outliers and correlations. Markdown/JSON output.
///
/// Examples:
///   cancerscope load --csv data/incidence_mortality_state.csv
///   cancerscope trends --state Victoria --cancer-type "Lung cancer"
///   cancerscope top-states --metric incidence_rate --limit 5
///   cancerscope compare --states Victoria,Tasmania --format json
///   cancerscope dashboard --output report.md
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .cancerscope.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, value_name = "PATH", env = "CANCERSCOPE_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate a default .cancerscope.toml configuration file
    InitConfig,

    /// Load the CSV export into the SQLite store (replaces existing tables)
    Load {
        /// CSV file to ingest; defaults to database.csv_path
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },

    /// Test the database connection and report the row count
    Check,

    /// List states, excluding the national aggregate
    States,

    /// List cancer types
    CancerTypes,

    /// Show the range of years present
    Years,

    /// List location rows
    Locations,

    /// Dump raw rows matching the filters
    Data {
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
    },

    /// Summarize every record of one state
    Summary {
        state: String,
    },

    /// Per-year mean of a metric for one state
    Series {
        state: String,
        #[arg(long)]
        metric: Option<Metric>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
    },

    /// Fit a linear trend over yearly means
    Trends {
        /// Restrict to one state; all rows otherwise
        #[arg(long)]
        state: Option<String>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Rank states by mean metric value
    TopStates {
        #[arg(long)]
        metric: Option<Metric>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
        /// Year to rank; the latest year present otherwise
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_name = "COUNT")]
        limit: Option<usize>,
    },

    /// Compare summary statistics across states
    ///
    /// Example: --states Victoria,Tasmania,Queensland
    Compare {
        #[arg(long, value_name = "STATES", value_delimiter = ',')]
        states: Vec<String>,
        #[arg(long)]
        metric: Option<Metric>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
    },

    /// Flag rows whose z-score exceeds a threshold
    Outliers {
        #[arg(long)]
        metric: Option<Metric>,
        #[arg(long, value_name = "Z")]
        threshold: Option<f64>,
    },

    /// Pairwise Pearson correlation between the four metrics
    Correlations,

    /// State by year matrix of mean metric values
    Heatmap {
        #[arg(long)]
        metric: Option<Metric>,
        #[arg(long, value_name = "TYPE")]
        cancer_type: Option<String>,
    },

    /// Per-state totals at the latest year, for map shading
    MapData {
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Combined report of lookups, national trend, rankings, correlations and outliers
    Dashboard,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::TopStates {
                limit: Some(0), ..
            } => Err("Limit must be at least 1".to_string()),
            Command::Outliers {
                threshold: Some(t), ..
            } if !(t.is_finite() && *t > 0.0) => {
                Err("Threshold must be a positive number".to_string())
            }
            Command::Summary { state } | Command::Series { state, .. }
                if state.trim().is_empty() =>
            {
                Err("State must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` value; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
