//! P2000 monitor CLI
//!
//! Local entry point hosting the polling coordinators.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use p2000::{
    error::{AppError, Result},
    models::{Config, HealthStatus, LoggingConfig, RegionConfig},
    pipeline::{self, Diagnostics, FilteredView, Monitor},
    services::{P2000Client, RecordExtractor, TimestampNormalizer},
};

/// p2000 - latest alarmfase1.nl dispatch per region
#[derive(Parser, Debug)]
#[command(name = "p2000", version, about = "P2000 incident monitor")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "p2000.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor all configured regions until interrupted
    Watch,

    /// Fetch a region once and show its latest incident
    Check {
        /// Region path, e.g. "amsterdam-amstelland"
        region_path: String,
    },

    /// Validate the configuration file
    Validate,

    /// Poll every configured region once and print diagnostics as JSON
    Diagnostics,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(&cli.config);

    let fallback = LoggingConfig::default();
    let level = loaded
        .as_ref()
        .map_or(fallback.level.as_str(), |c| c.logging.level.as_str());
    init_logging(cli.verbose, level);

    match cli.command {
        Command::Watch => watch(&require(loaded, &cli.config)?).await?,
        Command::Check { region_path } => {
            // A one-off check works against the public site without a config file.
            let config = Config::load_or_default(&cli.config);
            check(&config, &region_path).await?
        }
        Command::Validate => {
            log::info!("Validating configuration at {}...", cli.config.display());
            if let Err(e) = pipeline::validate_config_file(&cli.config) {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("All validations passed!");
        }
        Command::Diagnostics => diagnostics(&require(loaded, &cli.config)?).await?,
    }

    Ok(())
}

/// Surface a config load failure instead of falling back to defaults.
fn require(loaded: Result<Config>, path: &Path) -> Result<Config> {
    let config = loaded.inspect_err(|e| {
        log::error!("Failed to load config from {}: {}", path.display(), e);
    })?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

async fn start_regions(config: &Config) -> Result<Monitor> {
    config.validate()?;
    if config.regions.is_empty() {
        return Err(AppError::config("No regions configured"));
    }

    let mut monitor = Monitor::from_config(config)?;
    for failure in monitor.start_all(&config.regions).await {
        log::error!("{}", failure);
    }
    Ok(monitor)
}

async fn watch(config: &Config) -> Result<()> {
    let mut monitor = start_regions(config).await?;
    if monitor.is_empty() {
        return Err(AppError::config("No region could be started"));
    }

    for region in &config.regions {
        if let Some(rx) = monitor.subscribe(&region.region_path) {
            tokio::spawn(report(region.clone(), rx));
        }
    }

    log::info!("Watching {} region(s). Press Ctrl-C to stop.", monitor.len());
    tokio::signal::ctrl_c().await?;

    log::info!("Shutting down...");
    monitor.shutdown().await;
    log::info!("Done!");
    Ok(())
}

/// Log every snapshot of a region through its filtered view.
async fn report(
    region: RegionConfig,
    mut rx: tokio::sync::watch::Receiver<p2000::models::RegionSnapshot>,
) {
    let mut view = FilteredView::new(region.filters, region.display);
    loop {
        let snapshot = rx.borrow_and_update().clone();
        view.apply_snapshot(&snapshot);

        match snapshot.status {
            HealthStatus::Ok if snapshot.transition.is_update() => log::info!(
                "[{}] {} (matches filter: {})",
                snapshot.instance_name,
                view.state().unwrap_or("no incident"),
                view.matches_filter()
            ),
            HealthStatus::Ok => log::debug!(
                "[{}] {:?}, showing {}",
                snapshot.instance_name,
                snapshot.transition,
                view.state().unwrap_or("no incident")
            ),
            HealthStatus::Error => log::warn!(
                "[{}] update failed ({} consecutive), showing {}",
                snapshot.instance_name,
                snapshot.consecutive_errors,
                view.state().unwrap_or("no incident")
            ),
        }
        if let Some(attrs) = view.attributes() {
            log::debug!("[{}] {}", snapshot.instance_name, serde_json::Value::Object(attrs));
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn check(config: &Config, region_path: &str) -> Result<()> {
    let client = P2000Client::new(&config.scraper)?;
    let normalizer = TimestampNormalizer::new((&config.locale).into());
    let extractor = RecordExtractor::new(&config.selectors, normalizer)?;

    match pipeline::validate_region(&client, &extractor, region_path).await {
        Ok(Some(record)) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Ok(None) => {
            log::info!("Region is valid; no current incident listed");
            Ok(())
        }
        Err(e) => {
            log::error!("Region check failed ({}): {}", e.setup_code(), e);
            Err(AppError::setup(region_path, e))
        }
    }
}

async fn diagnostics(config: &Config) -> Result<()> {
    let mut monitor = start_regions(config).await?;

    for snapshot in monitor.snapshots() {
        if let Some(region) = monitor.region_config(&snapshot.region_path) {
            println!("{}", Diagnostics::new(region, &snapshot).to_json()?);
        }
    }

    monitor.shutdown().await;
    Ok(())
}
