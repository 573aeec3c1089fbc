//! Momentum evaluator
//!
//! Pure function of `(series, now, strategy)`. The evaluation is assumed to
//! run at the top of an hour and to assess the candle of the following
//! hour, which is where the `+1` in both the momentum offset and the
//! time-of-day gate comes from:
//!
//! - the momentum anchor is the last bar at or before
//!   `now + (1 - offset_hours)h`, truncated to the hour
//! - the time gate compares `(now.hour() + 1) % 24` with the hours of the
//!   configured times, ignoring their minutes
//!
//! Momentum is `(latest.close / anchor.open - 1) * 100`.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc, Weekday};
use serde::Serialize;

use crate::config::StrategyDefinition;
use crate::error::EvaluationError;
use crate::types::Bar;

const PERCENT: f64 = 100.0;

/// Outcome of evaluating one strategy against one bar series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub weekday_matches: bool,
    pub time_matches: bool,
    /// `None` when no bar exists at or before `target_time`
    /// or the target itself is out of range
    pub momentum: Option<f64>,
    pub momentum_matches: bool,
    pub anchor_bar: Option<Bar>,
    pub latest_bar: Bar,
    /// Instant the anchor search was run against, `None` if out of range
    pub target_time: Option<DateTime<Utc>>,
    pub all_match: bool,
}

impl EvaluationResult {
    /// Momentum if it is a usable finite number
    pub fn finite_momentum(&self) -> Option<f64> {
        self.momentum.filter(|m| m.is_finite())
    }
}

/// Instant the anchor bar is searched for: `now + (1 - offset_hours)h`,
/// truncated to the start of its hour.
///
/// `None` when the offset reaches outside the representable date range.
pub fn momentum_target(now: DateTime<Utc>, offset_hours: i64) -> Option<DateTime<Utc>> {
    let shift = TimeDelta::try_hours(1i64.checked_sub(offset_hours)?)?;
    now.checked_add_signed(shift)?
        .with_minute(0)?
        .with_second(0)?
        .with_nanosecond(0)
}

/// Most recent bar whose timestamp is not after `target`.
///
/// `series` must be ascending; the scan runs from the newest bar backwards.
pub fn find_anchor(series: &[Bar], target: DateTime<Utc>) -> Option<&Bar> {
    series.iter().rev().find(|bar| bar.timestamp <= target)
}

/// Percentage change from the anchor's open to the latest close.
///
/// An anchor open of zero is not guarded and yields an infinite or NaN value.
pub fn compute_momentum(latest: &Bar, anchor: &Bar) -> f64 {
    (latest.close / anchor.open - 1.0) * PERCENT
}

/// Strict AND of the configured thresholds. Undefined momentum never matches.
pub fn thresholds_match(
    momentum: Option<f64>,
    greater_than: Option<f64>,
    less_than: Option<f64>,
) -> bool {
    let Some(momentum) = momentum else {
        return false;
    };
    greater_than.map_or(true, |threshold| momentum > threshold)
        && less_than.map_or(true, |threshold| momentum < threshold)
}

pub fn weekday_matches(now: DateTime<Utc>, weekdays: &[Weekday]) -> bool {
    weekdays.contains(&now.weekday())
}

/// True when the hour after `now` equals the hour of any configured time.
/// Minutes of the configured times are ignored.
pub fn time_matches(now: DateTime<Utc>, times: &[NaiveTime]) -> bool {
    let next_hour = (now.hour() + 1) % 24;
    times.iter().any(|t| t.hour() == next_hour)
}

/// Evaluate a strategy against an ascending, non-empty bar series
pub fn evaluate(
    series: &[Bar],
    now: DateTime<Utc>,
    strategy: &StrategyDefinition,
) -> Result<EvaluationResult, EvaluationError> {
    let latest_bar = *series.last().ok_or_else(|| EvaluationError::EmptySeries {
        instrument: strategy.instrument.clone(),
    })?;

    let target_time = momentum_target(now, strategy.offset_hours);
    let anchor_bar = target_time
        .and_then(|target| find_anchor(series, target))
        .copied();
    let momentum = anchor_bar
        .as_ref()
        .map(|anchor| compute_momentum(&latest_bar, anchor));
    let momentum_matches = thresholds_match(momentum, strategy.greater_than, strategy.less_than);

    let weekday_matches = weekday_matches(now, &strategy.weekdays);
    let time_matches = time_matches(now, &strategy.times);

    Ok(EvaluationResult {
        weekday_matches,
        time_matches,
        momentum,
        momentum_matches,
        anchor_bar,
        latest_bar,
        target_time,
        all_match: weekday_matches && time_matches && momentum_matches,
    })
}
