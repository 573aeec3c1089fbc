//! Strategy momentum check - main entry point
//!
//! Evaluates the configured strategies once against the latest 5-minute
//! bars and prints which of them currently match.

use anyhow::Result;
use clap::Parser;
use momentum_check::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "momentum-check")]
#[command(about = "Check weekday, time-of-day and momentum conditions of trading strategies", long_about = None)]
#[command(version)]
struct Cli {
    /// Restrict evaluation to the strategy with exactly this name
    #[arg(short, long)]
    strategy: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Read bars from <DIR>/<INSTRUMENT>_5m.csv instead of Binance
    #[arg(long)]
    bars_dir: Option<String>,

    /// Evaluate as of this instant (RFC 3339) instead of now
    #[arg(long)]
    now: Option<String>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only report strategies active on the current weekday
    #[arg(long)]
    active_only: bool,

    /// Also write logs to a file in this directory
    #[arg(long)]
    log_dir: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool, log_dir: Option<&str>) -> Result<()> {
    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Stdout carries the report, logs go to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let mut log_path = None;
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let log_filename = format!(
                "evaluate_{}.log",
                chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
            );
            log_path = Some(PathBuf::from(dir).join(&log_filename));
            let file_appender = tracing_appender::rolling::never(dir, &log_filename);

            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_path {
        info!("Log file: {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_dir.as_deref())?;

    commands::evaluate::run(commands::evaluate::EvaluateOptions {
        config: cli.config,
        strategy: cli.strategy,
        bars_dir: cli.bars_dir,
        now: cli.now,
        json: cli.json,
        no_color: cli.no_color,
        active_only: cli.active_only,
    })
}
