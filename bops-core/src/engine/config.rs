//! Run configuration: risk parameters and engine settings.
//!
//! Both are validated once at construction and immutable for the run.

use crate::components::execution::{GapPolicy, PathPolicy};
use crate::domain::Side;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 1.5;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 0.75;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.0002;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 1000.0;
pub const DEFAULT_LOW_THRESHOLD: f64 = -1000.0;

/// Bracket percentages, commission and breadth thresholds.
///
/// Percentages are in percent units (1.5 means 1.5 %). Fields are private so
/// every instance has passed `new`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskConfig {
    take_profit_pct: f64,
    stop_loss_pct: f64,
    commission_rate: f64,
    high_threshold: f64,
    low_threshold: f64,
}

impl RiskConfig {
    pub fn new(
        take_profit_pct: f64,
        stop_loss_pct: f64,
        commission_rate: f64,
        high_threshold: f64,
        low_threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !take_profit_pct.is_finite() || take_profit_pct <= 0.0 {
            return Err(ConfigError::invalid(
                "take_profit_pct",
                format!("must be > 0, got {take_profit_pct}"),
            ));
        }
        if !stop_loss_pct.is_finite() || stop_loss_pct <= 0.0 {
            return Err(ConfigError::invalid(
                "stop_loss_pct",
                format!("must be > 0, got {stop_loss_pct}"),
            ));
        }
        // A short's stop at close * (1 - sl) must stay positive.
        if stop_loss_pct >= 100.0 || take_profit_pct >= 100.0 {
            return Err(ConfigError::invalid(
                "take_profit_pct/stop_loss_pct",
                "must be < 100",
            ));
        }
        if !commission_rate.is_finite() || commission_rate < 0.0 {
            return Err(ConfigError::invalid(
                "commission_rate",
                format!("must be >= 0, got {commission_rate}"),
            ));
        }
        if !high_threshold.is_finite() || !low_threshold.is_finite() {
            return Err(ConfigError::invalid("thresholds", "must be finite"));
        }
        if high_threshold <= low_threshold {
            return Err(ConfigError::invalid(
                "high_threshold",
                format!("must be > low_threshold ({high_threshold} <= {low_threshold})"),
            ));
        }
        Ok(Self {
            take_profit_pct,
            stop_loss_pct,
            commission_rate,
            high_threshold,
            low_threshold,
        })
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn high_threshold(&self) -> f64 {
        self.high_threshold
    }

    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    /// Take-profit price for a position entered at `entry`.
    pub fn take_profit_price(&self, side: Side, entry: f64) -> f64 {
        entry * (1.0 + side.sign() * self.take_profit_pct / 100.0)
    }

    /// Stop-loss price for a position entered at `entry`.
    pub fn stop_loss_price(&self, side: Side, entry: f64) -> f64 {
        entry * (1.0 - side.sign() * self.stop_loss_pct / 100.0)
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            commission_rate: DEFAULT_COMMISSION_RATE,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

/// Engine settings that are not strategy risk: capital, sizing, fill policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Fixed number of units per position.
    pub position_size: f64,
    #[serde(default)]
    pub path_policy: PathPolicy,
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

impl EngineConfig {
    pub fn new(initial_capital: f64, position_size: f64) -> Self {
        Self {
            initial_capital,
            position_size,
            path_policy: PathPolicy::default(),
            gap_policy: GapPolicy::default(),
        }
    }

    pub fn with_path_policy(mut self, path_policy: PathPolicy) -> Self {
        self.path_policy = path_policy;
        self
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::invalid(
                "initial_capital",
                format!("must be > 0, got {}", self.initial_capital),
            ));
        }
        if !self.position_size.is_finite() || self.position_size <= 0.0 {
            return Err(ConfigError::invalid(
                "position_size",
                format!("must be > 0, got {}", self.position_size),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(10_000.0, 1.0)
    }
}
