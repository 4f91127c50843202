//! Errors that abort a run.
//!
//! Conditions that merely prevent trading (no bars, not enough bars to warm up)
//! are not errors; see `RunOutcome::Skipped`.

use super::config::ConfigError;
use crate::domain::SeriesError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("breadth provider '{provider}' has no reading for bar {bar_index}")]
    MissingBreadth { provider: String, bar_index: usize },

    #[error("breadth provider '{provider}' returned non-finite reading {value} at bar {bar_index}")]
    NonFiniteBreadth {
        provider: String,
        bar_index: usize,
        value: f64,
    },
}
