//! Binance API types for klines (candlestick) data

use chrono::DateTime;

use crate::types::Bar;

/// Binance kline/candlestick data
/// API returns an array: [open_time, open, high, low, close, volume, close_time, ...]
/// Prices are decimal strings.
#[derive(Debug, Clone, PartialEq)]
pub struct BinanceKline {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl BinanceKline {
    /// Parse from raw JSON array returned by Binance API
    pub fn from_raw(raw: &[serde_json::Value]) -> Option<Self> {
        if raw.len() < 5 {
            return None;
        }

        Some(BinanceKline {
            open_time: raw[0].as_i64()?,
            open: raw[1].as_str()?.parse().ok()?,
            high: raw[2].as_str()?.parse().ok()?,
            low: raw[3].as_str()?.parse().ok()?,
            close: raw[4].as_str()?.parse().ok()?,
        })
    }

    /// Convert to a bar stamped with the kline's open time (UTC)
    pub fn to_bar(&self) -> Option<Bar> {
        let timestamp = DateTime::from_timestamp_millis(self.open_time)?;
        Some(Bar::new(timestamp, self.open, self.high, self.low, self.close))
    }
}

/// Interval the evaluator's anchor search is tuned for
pub const BAR_INTERVAL: &str = "5m";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_kline_from_raw() {
        let raw = vec![
            json!(1704103200000i64),
            json!("42000.10"),
            json!("42100.00"),
            json!("41950.5"),
            json!("42050.25"),
            json!("12.5"),
            json!(1704103499999i64),
        ];
        let kline = BinanceKline::from_raw(&raw).unwrap();
        assert_eq!(kline.open, 42000.10);
        assert_eq!(kline.close, 42050.25);

        let bar = kline.to_bar().unwrap();
        assert_eq!(bar.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(bar.high, 42100.0);
        assert_eq!(bar.low, 41950.5);
    }

    #[test]
    fn test_kline_from_raw_rejects_malformed_rows() {
        assert!(BinanceKline::from_raw(&[json!(1), json!("1.0")]).is_none());
        assert!(BinanceKline::from_raw(&[
            json!("not a timestamp"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
        ])
        .is_none());
        assert!(BinanceKline::from_raw(&[json!(0), json!("x"), json!("1"), json!("1"), json!("1")]).is_none());
    }
}
