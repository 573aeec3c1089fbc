//! Error types for configuration loading and strategy evaluation

use thiserror::Error;

/// Invalid strategy definition, detected once at load time.
///
/// Any of these aborts the run before a single strategy is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing strategy name (strategy #{index})")]
    MissingName { index: usize },

    #[error("Missing instrument for strategy {strategy}")]
    MissingInstrument { strategy: String },

    #[error("Invalid offset {offset} for strategy {strategy}, must be a positive number of hours")]
    InvalidOffset { strategy: String, offset: i64 },

    #[error("Missing momentum constraint for strategy {strategy}, set greater_than and/or less_than")]
    MissingThreshold { strategy: String },

    #[error("Duplicate strategy name {strategy}")]
    DuplicateName { strategy: String },
}

/// Precondition violations when evaluating a single strategy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("Empty bar series for instrument {instrument}")]
    EmptySeries { instrument: String },
}
