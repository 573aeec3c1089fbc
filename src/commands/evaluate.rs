//! Evaluate command - load strategies, fetch bars, print the report

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use momentum_check::binance::BinanceClient;
use momentum_check::data::{BinanceBarSource, CsvBarSource};
use momentum_check::report::{ConsoleReporter, JsonReporter, Reporter};
use momentum_check::{run_evaluations, Config, EvaluationRun};
use std::io::{self, IsTerminal, Write};
use tracing::info;

pub struct EvaluateOptions {
    pub config: String,
    pub strategy: Option<String>,
    pub bars_dir: Option<String>,
    pub now: Option<String>,
    pub json: bool,
    pub no_color: bool,
    pub active_only: bool,
}

pub fn run(options: EvaluateOptions) -> Result<()> {
    info!("Starting evaluation");

    // Every strategy is validated here, before any bars are fetched
    let config = Config::from_file(&options.config)?;
    info!(
        "Loaded {} strategies from: {}",
        config.strategies.len(),
        options.config
    );

    let now = match &options.now {
        Some(value) => parse_now(value)?,
        None => Utc::now(),
    };
    let filter = options.strategy.as_deref();

    let rt = tokio::runtime::Runtime::new()?;

    let run: EvaluationRun = match &options.bars_dir {
        Some(dir) => {
            info!("Reading bars from: {}", dir);
            let source = CsvBarSource::new(dir);
            rt.block_on(run_evaluations(&config, filter, &source, now))?
        }
        None => {
            let source = BinanceBarSource::new(BinanceClient::new()?);
            rt.block_on(run_evaluations(&config, filter, &source, now))?
        }
    };

    let reporter: Box<dyn Reporter> = if options.json {
        Box::new(JsonReporter)
    } else {
        Box::new(ConsoleReporter {
            color: !options.no_color && io::stdout().is_terminal(),
            active_weekdays_only: options.active_only,
        })
    };

    let mut out = io::stdout().lock();
    reporter.report(&run, &mut out)?;
    out.flush()?;

    info!(
        "{} of {} evaluated strategies match",
        run.matches().count(),
        run.reports.len()
    );

    Ok(())
}

fn parse_now(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid --now value {:?}, expected RFC 3339", value))
}
