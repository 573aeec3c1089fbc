//! Property tests for the evaluator.
//!
//! Uses proptest to verify:
//! 1. Anchor search returns the bar with the greatest timestamp <= target
//! 2. Undefined momentum never matches, whatever the thresholds
//! 3. Threshold combination is a strict AND of both bounds
//! 4. The time gate only looks at the hour after now

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use momentum_check::evaluator::{find_anchor, momentum_target, thresholds_match, time_matches};
use momentum_check::Bar;
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// Strictly ascending series built from positive minute gaps
fn arb_series() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(1i64..120, 1..200).prop_map(|gaps| {
        let mut t = base();
        gaps.into_iter()
            .map(|gap| {
                t += Duration::minutes(gap);
                Bar::new(t, 100.0, 101.0, 99.0, 100.5)
            })
            .collect()
    })
}

fn arb_threshold() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(-50.0..50.0_f64)
}

// ── 1. Anchor search ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn anchor_is_latest_bar_not_after_target(series in arb_series(), offset in -60i64..30_000) {
        let target = base() + Duration::minutes(offset);
        let expected = series.iter().filter(|b| b.timestamp <= target).max_by_key(|b| b.timestamp);

        prop_assert_eq!(find_anchor(&series, target), expected);
    }

    #[test]
    fn momentum_target_is_hour_aligned(minutes in 0i64..100_000, offset_hours in 1i64..200) {
        let now = base() + Duration::minutes(minutes);
        let target = momentum_target(now, offset_hours).unwrap();

        prop_assert_eq!(target.minute(), 0);
        prop_assert_eq!(target.second(), 0);
        prop_assert!(target <= now + Duration::hours(1 - offset_hours));
        prop_assert!(now + Duration::hours(1 - offset_hours) - target < Duration::hours(1));
    }
}

// ── 2./3. Thresholds ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn undefined_momentum_never_matches(gt in arb_threshold(), lt in arb_threshold()) {
        prop_assert!(!thresholds_match(None, gt, lt));
    }

    #[test]
    fn thresholds_are_strict_and(m in -100.0..100.0_f64, gt in arb_threshold(), lt in arb_threshold()) {
        let above = gt.map_or(true, |g| m > g);
        let below = lt.map_or(true, |l| m < l);
        prop_assert_eq!(thresholds_match(Some(m), gt, lt), above && below);
    }
}

// ── 4. Time gate ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn time_gate_matches_next_hour_any_minute(hour in 0u32..24, minute in 0u32..60, configured_minute in 0u32..60) {
        let now = base() + Duration::hours(hour as i64) + Duration::minutes(minute as i64);
        let next = NaiveTime::from_hms_opt((hour + 1) % 24, configured_minute, 0).unwrap();
        let same = NaiveTime::from_hms_opt(hour, configured_minute, 0).unwrap();

        prop_assert!(time_matches(now, &[next]));
        prop_assert!(!time_matches(now, &[same]));
    }
}
