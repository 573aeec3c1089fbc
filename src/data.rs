//! Bar series sources
//!
//! The evaluator needs an ascending, non-empty series per instrument. It
//! comes either from Binance (live) or from CSV files on disk (offline).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::binance::{BinanceClient, BAR_INTERVAL, MAX_KLINES_PER_REQUEST};
use crate::types::Bar;

/// Supplies the most recent bars of an instrument, oldest first
pub trait BarSource {
    /// Bars up to and including `end`
    fn fetch_bars(
        &self,
        instrument: &str,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Bar>>> + Send;
}

// =============================================================================
// Binance
// =============================================================================

/// Live 5-minute bars from Binance
#[derive(Debug, Clone)]
pub struct BinanceBarSource {
    client: BinanceClient,
}

impl BinanceBarSource {
    pub fn new(client: BinanceClient) -> Self {
        BinanceBarSource { client }
    }
}

impl BarSource for BinanceBarSource {
    async fn fetch_bars(&self, instrument: &str, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        let klines = self
            .client
            .get_ui_klines(
                instrument,
                BAR_INTERVAL,
                Some(end.timestamp_millis()),
                Some(MAX_KLINES_PER_REQUEST),
            )
            .await
            .with_context(|| format!("Failed to download {} bars from Binance", instrument))?;

        let bars = klines
            .iter()
            .map(|k| {
                k.to_bar()
                    .with_context(|| format!("Invalid open time {} for {}", k.open_time, instrument))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Fetched {} bars for {}", bars.len(), instrument);
        Ok(bars)
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Bars read from `<dir>/<instrument>_5m.csv`
#[derive(Debug, Clone)]
pub struct CsvBarSource {
    data_dir: PathBuf,
}

impl CsvBarSource {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        CsvBarSource {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, instrument: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.csv", instrument, BAR_INTERVAL))
    }
}

impl BarSource for CsvBarSource {
    async fn fetch_bars(&self, instrument: &str, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        let path = self.path_for(instrument);
        let mut bars = load_csv(&path)?;
        bars.retain(|bar| bar.timestamp <= end);
        info!("Loaded {} bars for {} from {}", bars.len(), instrument, path.display());
        Ok(bars)
    }
}

/// Load bars from a CSV with header `datetime,open,high,low,close[,volume]`.
///
/// `datetime` is RFC 3339 or `%Y-%m-%d %H:%M:%S` (assumed UTC).
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut bars = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let dt_str = record.get(0).context("Missing datetime column")?;
        let timestamp = parse_datetime(dt_str)?;

        let field = |idx: usize, name: &str| -> Result<f64> {
            record
                .get(idx)
                .with_context(|| format!("Missing {} column in row {}", name, row_idx + 1))?
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse {} in row {}", name, row_idx + 1))
        };

        bars.push(Bar::new(
            timestamp,
            field(1, "open")?,
            field(2, "high")?,
            field(3, "low")?,
            field(4, "close")?,
        ));
    }

    Ok(bars)
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .with_context(|| format!("Failed to parse datetime: {}", value))
}

// =============================================================================
// Validation
// =============================================================================

/// Check the series precondition: non-empty and strictly ascending timestamps
pub fn ensure_series(instrument: &str, bars: &[Bar]) -> Result<()> {
    if bars.is_empty() {
        anyhow::bail!("No bars available for {}", instrument);
    }

    if let Some(i) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        anyhow::bail!(
            "Bars for {} are not in ascending order at index {} ({} after {})",
            instrument,
            i + 1,
            bars[i + 1].timestamp,
            bars[i].timestamp
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::io::Write;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_ensure_series() {
        let a = Bar::new(t0(), 1.0, 1.0, 1.0, 1.0);
        let b = Bar::new(t0() + Duration::minutes(5), 1.0, 1.0, 1.0, 1.0);

        assert!(ensure_series("X", &[a, b]).is_ok());
        assert!(ensure_series("X", &[]).is_err());
        assert!(ensure_series("X", &[b, a]).is_err());
        assert!(ensure_series("X", &[a, a]).is_err());
    }

    #[tokio::test]
    async fn test_csv_source_reads_and_cuts_at_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvBarSource::new(dir.path());
        let mut file = std::fs::File::create(source.path_for("BTCUSDT")).unwrap();
        writeln!(file, "datetime,open,high,low,close,volume").unwrap();
        writeln!(file, "2024-03-04T10:00:00Z,100,101,99,100.5,10").unwrap();
        writeln!(file, "2024-03-04 10:05:00,100.5,102,100,101.5,12").unwrap();
        writeln!(file, "2024-03-04T10:10:00+00:00,101.5,103,101,102.5,8").unwrap();
        drop(file);

        let bars = source
            .fetch_bars("BTCUSDT", t0() + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, t0());
        assert_eq!(bars[1].timestamp, t0() + Duration::minutes(5));
        assert_eq!(bars[1].close, 101.5);
    }

    #[tokio::test]
    async fn test_csv_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvBarSource::new(dir.path());
        assert!(source.fetch_bars("NOPE", t0()).await.is_err());
    }

    #[test]
    fn test_load_csv_rejects_bad_price() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "datetime,open,high,low,close\n2024-03-04T10:00:00Z,abc,1,1,1\n").unwrap();
        assert!(load_csv(&path).is_err());
    }
}
