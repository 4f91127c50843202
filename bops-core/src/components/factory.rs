//! Factory — converts a serializable strategy selection into a runtime policy.

use super::signal::bar_pattern::DEFAULT_VOLUME_WINDOW;
use super::signal::sma_crossover::DEFAULT_SMA_WINDOW;
use super::signal::{BarPattern, SignalPolicy, SmaCrossover};
use crate::engine::ConfigError;
use serde::{Deserialize, Serialize};

/// Which entry rule to run, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum StrategyVariant {
    BarPattern {
        #[serde(default = "default_volume_window")]
        volume_window: usize,
    },
    SmaCrossover {
        #[serde(default = "default_sma_window")]
        sma_window: usize,
        #[serde(default = "default_volume_window")]
        volume_window: usize,
    },
}

fn default_volume_window() -> usize {
    DEFAULT_VOLUME_WINDOW
}

fn default_sma_window() -> usize {
    DEFAULT_SMA_WINDOW
}

impl Default for StrategyVariant {
    fn default() -> Self {
        StrategyVariant::BarPattern {
            volume_window: DEFAULT_VOLUME_WINDOW,
        }
    }
}

impl StrategyVariant {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = match self {
            StrategyVariant::BarPattern { volume_window } => vec![("volume_window", *volume_window)],
            StrategyVariant::SmaCrossover {
                sma_window,
                volume_window,
            } => vec![("sma_window", *sma_window), ("volume_window", *volume_window)],
        };
        for (field, window) in windows {
            if window == 0 {
                return Err(ConfigError::InvalidConfig {
                    field,
                    reason: "must be >= 1".into(),
                });
            }
        }
        Ok(())
    }
}

/// Build the signal policy for `variant`.
pub fn create_signal(variant: &StrategyVariant) -> Result<Box<dyn SignalPolicy>, ConfigError> {
    variant.validate()?;
    Ok(match variant {
        StrategyVariant::BarPattern { volume_window } => Box::new(BarPattern::new(*volume_window)),
        StrategyVariant::SmaCrossover {
            sma_window,
            volume_window,
        } => Box::new(SmaCrossover::new(*sma_window, *volume_window)),
    })
}
