//! Configuration management
//!
//! Loads strategy definitions from a JSON file and validates every one of
//! them before anything is evaluated. A single invalid definition rejects
//! the whole file.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::types::Direction;

/// Default location of the strategy file
pub const DEFAULT_CONFIG_PATH: &str = "configs/strategies.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategies: Vec<StrategyDefinition>,
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&contents)?;
        debug!(
            "Loaded {} strategies from {}",
            config.strategies.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(contents).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Check every strategy in configuration order, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            strategy.validate(index)?;

            if !seen.insert(strategy.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    strategy: strategy.name.clone(),
                });
            }

            if strategy.weekdays.is_empty() {
                warn!("Strategy {} has no weekdays and can never match", strategy.name);
            }
            if strategy.times.is_empty() {
                warn!("Strategy {} has no times and can never match", strategy.name);
            }
        }

        Ok(())
    }

    /// Strategies selected by an exact-name filter, in configuration order.
    /// `None` or an empty filter selects everything.
    pub fn select(&self, filter: Option<&str>) -> Vec<&StrategyDefinition> {
        match filter.filter(|name| !name.is_empty()) {
            Some(name) => self.strategies.iter().filter(|s| s.name == name).collect(),
            None => self.strategies.iter().collect(),
        }
    }
}

/// A single strategy: gating conditions plus the momentum thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStrategyDefinition")]
pub struct StrategyDefinition {
    pub name: String,
    pub instrument: String,
    /// Hours to look back from now for the momentum anchor bar
    pub offset_hours: i64,
    /// Momentum must be strictly above this percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<f64>,
    /// Momentum must be strictly below this percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub less_than: Option<f64>,
    pub weekdays: Vec<Weekday>,
    #[serde(serialize_with = "time_of_day::serialize")]
    pub times: Vec<NaiveTime>,
    pub direction: Direction,
}

impl StrategyDefinition {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingName { index });
        }
        if self.instrument.trim().is_empty() {
            return Err(ConfigError::MissingInstrument {
                strategy: self.name.clone(),
            });
        }
        if self.offset_hours <= 0 {
            return Err(ConfigError::InvalidOffset {
                strategy: self.name.clone(),
                offset: self.offset_hours,
            });
        }
        if self.greater_than.is_none() && self.less_than.is_none() {
            return Err(ConfigError::MissingThreshold {
                strategy: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// On-disk shape. Missing fields default to values that fail validation
/// so they are reported with the strategy name instead of as parse errors.
#[derive(Debug, Deserialize)]
struct RawStrategyDefinition {
    #[serde(default)]
    name: String,
    #[serde(default, alias = "currency")]
    instrument: String,
    #[serde(default, alias = "offset")]
    offset_hours: i64,
    #[serde(default, alias = "greaterThan")]
    greater_than: Option<f64>,
    #[serde(default, alias = "lessThan")]
    less_than: Option<f64>,
    #[serde(default)]
    weekdays: Vec<Weekday>,
    #[serde(default, deserialize_with = "time_of_day::deserialize")]
    times: Vec<NaiveTime>,
    #[serde(default)]
    direction: Option<Direction>,
    /// Legacy flag, `true` means Up
    #[serde(default)]
    up: Option<bool>,
}

impl From<RawStrategyDefinition> for StrategyDefinition {
    fn from(raw: RawStrategyDefinition) -> Self {
        let direction = match (raw.direction, raw.up) {
            (Some(direction), _) => direction,
            (None, Some(false)) => Direction::Down,
            (None, _) => Direction::Up,
        };

        StrategyDefinition {
            name: raw.name,
            instrument: raw.instrument,
            offset_hours: raw.offset_hours,
            greater_than: raw.greater_than,
            less_than: raw.less_than,
            weekdays: raw.weekdays,
            times: raw.times,
            direction,
        }
    }
}

/// `HH:MM` (or `HH:MM:SS`) times of day
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(times: &[NaiveTime], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(times.iter().map(|t| t.format("%H:%M").to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NaiveTime>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                parse(s).ok_or_else(|| {
                    de::Error::custom(format!("invalid time of day {:?}, expected HH:MM", s))
                })
            })
            .collect()
    }
}
