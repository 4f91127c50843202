//! Parallel batch runs.
//!
//! Each job carries its own config and fully materialized series. Jobs share
//! nothing, so they fan out across the rayon pool; results come back in job
//! order and match what sequential execution would produce.

use bops_core::domain::BarSeries;
use rayon::prelude::*;
use tracing::info;

use crate::config::BacktestConfig;
use crate::data::{fetch_series, MarketDataProvider};
use crate::runner::{data_request, run_backtest_on_series, BacktestResult, RunError};

/// One independent backtest: configuration plus the bars it runs on.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub label: String,
    pub config: BacktestConfig,
    pub series: BarSeries,
    pub data_source: String,
}

impl BatchJob {
    pub fn new(label: impl Into<String>, config: BacktestConfig, series: BarSeries) -> Self {
        Self {
            label: label.into(),
            config,
            series,
            data_source: "preloaded".into(),
        }
    }

    /// Resolve the job's data through `provider`. All I/O happens here,
    /// before the batch starts.
    pub fn fetch(
        label: impl Into<String>,
        config: BacktestConfig,
        provider: &dyn MarketDataProvider,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let series = fetch_series(provider, &data_request(&config))?;
        Ok(Self {
            label: label.into(),
            config,
            series,
            data_source: provider.name().to_string(),
        })
    }
}

/// Run every job in parallel. Output index `i` belongs to `jobs[i]`.
pub fn run_batch(jobs: &[BatchJob]) -> Vec<Result<BacktestResult, RunError>> {
    info!(jobs = jobs.len(), threads = rayon::current_num_threads(), "starting batch");
    let results: Vec<_> = jobs
        .par_iter()
        .map(|job| run_backtest_on_series(&job.config, &job.series, &job.data_source))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(jobs = jobs.len(), failed, "batch complete");
    results
}

/// Sequential reference for `run_batch`.
pub fn run_sequential(jobs: &[BatchJob]) -> Vec<Result<BacktestResult, RunError>> {
    jobs.iter()
        .map(|job| run_backtest_on_series(&job.config, &job.series, &job.data_source))
        .collect()
}
