//! Backtest runner — wires configuration, data, the engine, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: fetches bars through a provider, then runs. Used by the CLI.
//! - `run_backtest_on_series()`: takes an already validated series. No I/O;
//!   used by batch runs and tests.

use bops_core::components::create_signal;
use bops_core::domain::{BarSeries, Timeframe};
use bops_core::engine::{self, EngineError, RunOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data::{fetch_series, DataError, DataRequest, MarketDataProvider};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<bops_core::ConfigError> for RunError {
    fn from(err: bops_core::ConfigError) -> Self {
        RunError::Config(ConfigError::Invalid(err))
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub data_source: String,
    pub dataset_hash: String,
    pub bars_per_year: f64,
    pub outcome: RunOutcome,
    /// `None` when the run was skipped.
    pub metrics: Option<PerformanceMetrics>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn is_completed(&self) -> bool {
        self.outcome.completed().is_some()
    }
}

/// Build the data request a config describes.
pub fn data_request(config: &BacktestConfig) -> DataRequest {
    DataRequest::new(
        config.backtest.symbol.clone(),
        config.backtest.start,
        config.backtest.end_date(),
        config.backtest.timeframe,
    )
}

/// Fetch bars for `config` and run one backtest.
pub fn run_backtest(
    config: &BacktestConfig,
    provider: &dyn MarketDataProvider,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let request = data_request(config);
    let series = fetch_series(provider, &request)?;
    run_backtest_on_series(config, &series, provider.name())
}

/// Run one backtest on pre-loaded bars. No I/O.
pub fn run_backtest_on_series(
    config: &BacktestConfig,
    series: &BarSeries,
    data_source: &str,
) -> Result<BacktestResult, RunError> {
    let params = config.validate()?;
    let policy = create_signal(&config.strategy)?;
    let breadth = config.breadth.build();
    let bars_per_year = config.backtest.bars_per_year();

    let outcome = engine::run(series, policy.as_ref(), breadth.as_ref(), &params.risk, &params.engine)?;
    let metrics = outcome
        .completed()
        .map(|result| PerformanceMetrics::from_run(result, series, bars_per_year));

    let dataset_hash = series.dataset_hash();
    let run_id = config.run_id(&dataset_hash)?;

    match (&outcome, &metrics) {
        (RunOutcome::Completed(_), Some(m)) => info!(
            run_id = %run_id,
            symbol = series.symbol(),
            total_return_pct = m.total_return_pct,
            sharpe = m.sharpe,
            win_rate_pct = m.win_rate_pct,
            trades = m.trade_count,
            "backtest complete"
        ),
        (RunOutcome::Skipped(reason), _) => info!(
            run_id = %run_id,
            symbol = series.symbol(),
            %reason,
            "backtest skipped"
        ),
        _ => {}
    }

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        symbol: series.symbol().to_string(),
        timeframe: config.backtest.timeframe,
        start: config.backtest.start,
        end: config.backtest.end_date(),
        data_source: data_source.to_string(),
        dataset_hash,
        bars_per_year,
        outcome,
        metrics,
    })
}
