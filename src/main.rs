//! CancerScope - cancer incidence and mortality analytics
//!
//! A CLI tool that loads state-level cancer statistics into SQLite and
//! computes trends, rankings, state comparisons, outliers and metric
//! correlations, rendered as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error or an operation returned an error payload

use anyhow::{Context, Result};
use cancerscope::analysis::{AnalyticsService, AnalyticsSettings, CachePolicy};
use cancerscope::cli::{Args, Command, OutputFormat};
use cancerscope::config::{Config, CONFIG_FILE};
use cancerscope::models::{DataFilter, Metric, StoreStatus};
use cancerscope::report::{self, Dashboard, DashboardOptions, RenderMarkdown};
use cancerscope::source::{DataService, DataSource, SqliteSource};
use cancerscope::{loader, ApiResponse};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command == Command::InitConfig {
        return handle_init_config();
    }

    // Config is read first so `[general] verbose` can pick the log level.
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("CancerScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    match run(args, config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .cancerscope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to change the database path, cache and analytics defaults.");
    Ok(())
}

/// Initialize logging at `level`.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Where and how results are written.
struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
}

impl Output {
    /// Render one operation result. Returns the exit code for it.
    fn emit<T>(&self, title: &str, result: cancerscope::Result<T>) -> Result<i32>
    where
        T: Serialize + RenderMarkdown,
    {
        let response = ApiResponse::from(result);
        let content = match self.format {
            OutputFormat::Json => report::generate_json(&response)?,
            OutputFormat::Markdown => report::generate_markdown(title, &response),
        };
        self.write(&content)?;

        Ok(if response.is_success() { 0 } else { 1 })
    }

    fn write(&self, content: &str) -> Result<()> {
        match self.path {
            Some(ref path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write output to {}", path.display()))?;
                println!("✅ Output saved to: {}", path.display());
            }
            None => println!("{}", content.trim_end()),
        }
        Ok(())
    }
}

/// Run one command. Returns the exit code.
fn run(args: Args, config: Config) -> Result<i32> {
    let out = Output {
        format: config.general.format,
        path: args.output.clone(),
    };

    if let Command::Load { ref csv } = args.command {
        let options = loader::LoadOptions {
            csv_path: csv
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.database.csv_path)),
            db_path: PathBuf::from(&config.database.path),
            show_progress: !args.quiet,
        };
        let summary = loader::load_csv(&options)?;
        return out.emit("Data Load", Ok(summary));
    }

    let db_path = &config.database.path;
    let store = SqliteSource::new(db_path).with_context(|| {
        format!(
            "Cannot open database {}; run `cancerscope load` first",
            db_path
        )
    })?;

    if args.command == Command::Check {
        let status = StoreStatus {
            database: db_path.clone(),
            sqlite_version: store.test_connection()?,
            records: store.count()?,
        };
        return out.emit("Connection Check", Ok(status));
    }

    let data = DataService::new(Arc::new(store), config.analytics.national_label.clone());
    let service = AnalyticsService::new(
        data,
        AnalyticsSettings::from(&config.analytics),
        CachePolicy::from(&config.cache),
    );
    let analytics = &config.analytics;
    let metric_or_default =
        |metric: Option<Metric>| metric.unwrap_or(analytics.default_metric);

    match args.command {
        Command::States => out.emit("States", service.data().states()),
        Command::CancerTypes => out.emit("Cancer Types", service.data().cancer_types()),
        Command::Years => out.emit("Years", service.data().years_range()),
        Command::Locations => out.emit("Locations", service.data().locations()),
        Command::Data {
            state,
            year,
            cancer_type,
        } => {
            let filter = DataFilter::from_parts(state.as_deref(), year, cancer_type.as_deref());
            out.emit("Cancer Data", service.data().cancer_data(&filter))
        }
        Command::Summary { state } => out.emit(
            &format!("State Summary: {}", state),
            service.data().state_summary(&state),
        ),
        Command::Series {
            state,
            metric,
            cancer_type,
        } => {
            let metric = metric_or_default(metric);
            out.emit(
                &format!("{} by Year: {}", metric.label(), state),
                service
                    .data()
                    .yearly_series(&state, metric, cancer_type.as_deref()),
            )
        }
        Command::Trends {
            state,
            cancer_type,
            metric,
        } => {
            let metric = metric_or_default(metric);
            let title = format!(
                "{} Trend: {}",
                metric.label(),
                state.as_deref().unwrap_or("All Rows")
            );
            out.emit(
                &title,
                service.calculate_trends(state.as_deref(), cancer_type.as_deref(), metric),
            )
        }
        Command::TopStates {
            metric,
            cancer_type,
            year,
            limit,
        } => {
            let metric = metric_or_default(metric);
            let limit = limit.unwrap_or(analytics.top_limit);
            out.emit(
                &format!("Top States by {}", metric.label()),
                service.top_states(metric, cancer_type.as_deref(), year, limit),
            )
        }
        Command::Compare {
            states,
            metric,
            cancer_type,
        } => {
            let states: Vec<String> = states
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            out.emit(
                "State Comparison",
                service.compare_states(&states, metric_or_default(metric), cancer_type.as_deref()),
            )
        }
        Command::Outliers { metric, threshold } => {
            let threshold = threshold.unwrap_or(analytics.outlier_threshold);
            out.emit(
                "Outliers",
                service.outliers(metric_or_default(metric), threshold),
            )
        }
        Command::Correlations => out.emit("Metric Correlations", service.correlations()),
        Command::Heatmap {
            metric,
            cancer_type,
        } => out.emit(
            "Heatmap",
            service
                .data()
                .heatmap(metric_or_default(metric), cancer_type.as_deref()),
        ),
        Command::MapData { metric } => {
            let metric = metric_or_default(metric);
            out.emit(
                &format!("{} by State (latest year)", metric.label()),
                service.data().map_data(metric),
            )
        }
        Command::Dashboard => {
            let options = DashboardOptions {
                database: db_path.clone(),
                metric: analytics.default_metric,
                top_limit: analytics.top_limit,
                outlier_threshold: analytics.outlier_threshold,
            };
            let dashboard = Dashboard::build(&service, &options);
            let content = match out.format {
                OutputFormat::Json => serde_json::to_string_pretty(&dashboard)?,
                OutputFormat::Markdown => report::generate_dashboard_markdown(&dashboard),
            };
            out.write(&content)?;
            Ok(0)
        }
        Command::InitConfig | Command::Load { .. } | Command::Check => {
            anyhow::bail!("command is handled before the store is opened")
        }
    }
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    Default,
    Builtin,
    Fallback(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::Default => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default() {
        Ok(Some(config)) => (config, ConfigOrigin::Default),
        Ok(None) => (Config::default(), ConfigOrigin::Builtin),
        Err(e) => (Config::default(), ConfigOrigin::Fallback(format!("{:#}", e))),
    })
}
