//! Evaluation service: select strategies, fetch their bars, evaluate

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{Config, StrategyDefinition};
use crate::data::{ensure_series, BarSource};
use crate::evaluator::{self, EvaluationResult};
use crate::types::Bar;

/// One evaluated strategy, paired with the definition it came from
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: StrategyDefinition,
    pub result: EvaluationResult,
}

/// All results of one invocation, in configuration order
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    pub now: DateTime<Utc>,
    pub reports: Vec<StrategyReport>,
}

impl EvaluationRun {
    /// Reports whose conditions all hold
    pub fn matches(&self) -> impl Iterator<Item = &StrategyReport> {
        self.reports.iter().filter(|r| r.result.all_match)
    }
}

/// Evaluate the strategies selected by `filter` (exact name; `None` = all).
///
/// Each instrument is fetched once per run and shared read-only between the
/// strategies that use it.
pub async fn run_evaluations<S: BarSource>(
    config: &Config,
    filter: Option<&str>,
    source: &S,
    now: DateTime<Utc>,
) -> Result<EvaluationRun> {
    let selected = config.select(filter);
    if selected.is_empty() {
        match filter {
            Some(name) if !name.is_empty() => warn!("No strategy named {}", name),
            _ => warn!("No strategies configured"),
        }
    }

    let mut series: HashMap<&str, Vec<Bar>> = HashMap::new();
    let mut reports = Vec::with_capacity(selected.len());

    for strategy in selected {
        let instrument = strategy.instrument.as_str();
        if !series.contains_key(instrument) {
            let bars = source.fetch_bars(instrument, now).await?;
            ensure_series(instrument, &bars)?;
            debug!("Using {} bars for {}", bars.len(), instrument);
            series.insert(instrument, bars);
        }
        let bars = series.get(instrument).map(Vec::as_slice).unwrap_or_default();

        let result = evaluator::evaluate(bars, now, strategy)?;
        match result.momentum {
            Some(momentum) => info!(
                "{}: momentum {:+.2}% (weekday={}, time={}, momentum={}, all={})",
                strategy.name,
                momentum,
                result.weekday_matches,
                result.time_matches,
                result.momentum_matches,
                result.all_match
            ),
            None => match result.target_time {
                Some(target) => warn!(
                    "{}: no bar at or before {} for {}, momentum undefined",
                    strategy.name, target, instrument
                ),
                None => warn!(
                    "{}: offset of {}h is out of range, momentum undefined",
                    strategy.name, strategy.offset_hours
                ),
            },
        }

        reports.push(StrategyReport {
            strategy: strategy.clone(),
            result,
        });
    }

    Ok(EvaluationRun { now, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        bars: Vec<Bar>,
        calls: AtomicUsize,
    }

    impl BarSource for CountingSource {
        async fn fetch_bars(&self, _instrument: &str, _end: DateTime<Utc>) -> Result<Vec<Bar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bars.clone())
        }
    }

    fn config() -> Config {
        Config::from_json(
            r#"{ "strategies": [
                { "name": "a", "instrument": "BTCUSDT", "offset_hours": 2, "greater_than": 0,
                  "weekdays": ["Mon"], "times": ["11:00"] },
                { "name": "b", "instrument": "BTCUSDT", "offset_hours": 3, "less_than": 0,
                  "weekdays": ["Mon"], "times": ["11:00"] }
            ] }"#,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_shared_instrument_fetched_once() {
        let source = CountingSource {
            bars: (0..30)
                .map(|i| {
                    let price = 100.0 + i as f64;
                    Bar::new(now() - Duration::minutes(5 * (29 - i)), price, price, price, price)
                })
                .collect(),
            calls: AtomicUsize::new(0),
        };

        let run = run_evaluations(&config(), None, &source, now()).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(run.reports.len(), 2);
        assert_eq!(run.reports[0].strategy.name, "a");
        assert_eq!(run.reports[1].strategy.name, "b");
        assert!(run.reports[0].result.momentum_matches);
        assert!(!run.reports[1].result.momentum_matches);
        assert_eq!(run.matches().count(), 1);
    }

    #[tokio::test]
    async fn test_empty_series_fails_run() {
        let source = CountingSource {
            bars: vec![],
            calls: AtomicUsize::new(0),
        };
        assert!(run_evaluations(&config(), None, &source, now()).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_filter_yields_empty_run() {
        let source = CountingSource {
            bars: vec![],
            calls: AtomicUsize::new(0),
        };
        let run = run_evaluations(&config(), Some("missing"), &source, now())
            .await
            .unwrap();
        assert!(run.reports.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
