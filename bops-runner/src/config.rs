//! Serializable backtest configuration (TOML).
//!
//! A config file has one section per concern; every field has a default, so
//! an empty file is a valid config:
//!
//! ```toml
//! [backtest]
//! symbol = "MNQ=F"
//! timeframe = "1h"
//! start = "2023-01-01"
//!
//! [risk]
//! take_profit_pct = 1.5
//! stop_loss_pct = 0.75
//!
//! [strategy]
//! variant = "bar_pattern"
//! volume_window = 20
//!
//! [breadth]
//! source = "seeded"
//! seed = 42
//!
//! [execution]
//! path_policy = "worst_case"
//!
//! [data]
//! source = "yahoo"
//! ```

use std::path::{Path, PathBuf};

use bops_core::components::{BreadthSource, GapPolicy, PathPolicy, StrategyVariant};
use bops_core::domain::Timeframe;
use bops_core::engine::config::{
    DEFAULT_COMMISSION_RATE, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD,
    DEFAULT_STOP_LOSS_PCT, DEFAULT_TAKE_PROFIT_PCT,
};
use bops_core::engine::{EngineConfig, RiskConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a run (content hash of configuration and data).
pub type RunId = String;

/// Instruments offered by default (Micro Nasdaq, Micro S&P, Mini Dow futures).
pub const DEFAULT_SYMBOLS: [&str; 3] = ["MNQ=F", "MES=F", "YM=F"];

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_POSITION_SIZE: f64 = 1.0;
pub const DEFAULT_SYNTHETIC_SEED: u64 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] bops_core::ConfigError),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Complete configuration of one backtest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub risk: RiskSection,
    pub strategy: StrategyVariant,
    pub breadth: BreadthSource,
    pub execution: ExecutionSection,
    pub data: DataSourceConfig,
}

/// Instrument, interval, date range and capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: NaiveDate,
    /// Inclusive end date; today when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    pub initial_capital: f64,
    /// Units per position.
    pub position_size: f64,
    /// Overrides the timeframe's annualization base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bars_per_year: Option<f64>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOLS[0].to_string(),
            timeframe: Timeframe::H1,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            end: None,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            position_size: DEFAULT_POSITION_SIZE,
            bars_per_year: None,
        }
    }
}

impl BacktestSection {
    pub fn end_date(&self) -> NaiveDate {
        self.end.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn bars_per_year(&self) -> f64 {
        self.bars_per_year
            .unwrap_or_else(|| self.timeframe.bars_per_year())
    }
}

/// Bracket sizes, commission and breadth thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub commission: f64,
    pub high_threshold: f64,
    pub low_threshold: f64,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            commission: DEFAULT_COMMISSION_RATE,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

impl RiskSection {
    pub fn to_risk_config(&self) -> Result<RiskConfig, bops_core::ConfigError> {
        RiskConfig::new(
            self.take_profit_pct,
            self.stop_loss_pct,
            self.commission,
            self.high_threshold,
            self.low_threshold,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    pub path_policy: PathPolicy,
    pub gap_policy: GapPolicy,
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataSourceConfig {
    /// Yahoo Finance chart API.
    #[default]
    Yahoo,
    /// Local CSV file with `timestamp,open,high,low,close,volume` columns.
    Csv { path: PathBuf },
    /// Seeded random walk, for offline runs.
    Synthetic {
        #[serde(default = "default_synthetic_seed")]
        seed: u64,
    },
}

fn default_synthetic_seed() -> u64 {
    DEFAULT_SYNTHETIC_SEED
}

/// Validated engine inputs derived from a [`BacktestConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    pub risk: RiskConfig,
    pub engine: EngineConfig,
}

impl BacktestConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every invariant and build the engine's validated inputs.
    pub fn validate(&self) -> Result<RunParameters, ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(bops_core::ConfigError::InvalidConfig {
                field: "backtest.symbol",
                reason: "must not be empty".into(),
            }
            .into());
        }
        if let Some(bpy) = self.backtest.bars_per_year {
            if !bpy.is_finite() || bpy <= 0.0 {
                return Err(bops_core::ConfigError::InvalidConfig {
                    field: "backtest.bars_per_year",
                    reason: format!("must be > 0, got {bpy}"),
                }
                .into());
            }
        }
        let end = self.backtest.end_date();
        if self.backtest.start > end {
            return Err(ConfigError::InvalidDateRange {
                start: self.backtest.start,
                end,
            });
        }

        self.strategy.validate()?;
        let risk = self.risk.to_risk_config()?;
        let engine = EngineConfig::new(self.backtest.initial_capital, self.backtest.position_size)
            .with_path_policy(self.execution.path_policy)
            .with_gap_policy(self.execution.gap_policy);
        engine.validate()?;

        Ok(RunParameters { risk, engine })
    }

    /// Deterministic run fingerprint: BLAKE3 over the canonical JSON config
    /// followed by the dataset hash.
    ///
    /// Identical config and identical bars give the same id.
    pub fn run_id(&self, dataset_hash: &str) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(json.as_bytes());
        hasher.update(dataset_hash.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }
}

/// Annotated default configuration, as printed by `bops init-config`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# BOPS backtest configuration

[backtest]
# MNQ=F (Micro Nasdaq), MES=F (Micro S&P), YM=F (Mini Dow)
symbol = "MNQ=F"
# 15m, 30m, 1h, 4h, 1d
timeframe = "1h"
start = "2023-01-01"
# end = "2024-01-01"      # defaults to today
initial_capital = 10000.0
position_size = 1.0
# bars_per_year = 1764.0  # defaults to 252 sessions x bars per session

[risk]
take_profit_pct = 1.5
stop_loss_pct = 0.75
commission = 0.0002
high_threshold = 1000.0
low_threshold = -1000.0

[strategy]
# bar_pattern | sma_crossover (adds sma_window)
variant = "bar_pattern"
volume_window = 20

[breadth]
# seeded | constant (value) | fixed (readings)
source = "seeded"
seed = 42
min = -1500
max = 1500

[execution]
# worst_case | best_case | deterministic
path_policy = "worst_case"
# fill_at_trigger | fill_at_open
gap_policy = "fill_at_trigger"

[data]
# yahoo | csv (path) | synthetic (seed)
source = "yahoo"
"#;
