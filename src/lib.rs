//! Strategy Momentum Check
//!
//! Evaluates user-defined strategies against recent price bars and reports
//! whether their weekday, time-of-day and momentum conditions hold right
//! now. Decision support only: nothing is traded, stored or scheduled.
//!
//! # Example
//! ```no_run
//! use momentum_check::binance::BinanceClient;
//! use momentum_check::data::BinanceBarSource;
//! use momentum_check::report::{ConsoleReporter, Reporter};
//! use momentum_check::{run_evaluations, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("configs/strategies.json")?;
//!     let source = BinanceBarSource::new(BinanceClient::new()?);
//!     let run = run_evaluations(&config, None, &source, chrono::Utc::now()).await?;
//!     ConsoleReporter::default().report(&run, &mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod report;
pub mod runner;
pub mod types;

pub use config::{Config, StrategyDefinition};
pub use error::{ConfigError, EvaluationError};
pub use evaluator::{evaluate, EvaluationResult};
pub use runner::{run_evaluations, EvaluationRun, StrategyReport};
pub use types::*;
