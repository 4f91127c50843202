//! BOPS Runner — configuration, market data, batch runs, metrics and export.
//!
//! This crate builds on `bops-core` to provide:
//! - TOML backtest configuration with defaults and validation
//! - Market data providers (Yahoo, CSV, synthetic) and a TTL cache
//! - Single-run wrapper with run fingerprinting
//! - Parallel batch runs over independent jobs
//! - Performance metrics and CSV/JSON artifact export

pub mod batch;
pub mod config;
pub mod data;
pub mod export;
pub mod metrics;
pub mod runner;

pub use batch::{run_batch, BatchJob};
pub use config::{BacktestConfig, ConfigError, DataSourceConfig, RunId, RunParameters};
pub use data::{
    build_provider, fetch_series, CachedProvider, CsvProvider, DataError, DataRequest,
    MarketDataProvider, SyntheticProvider, YahooProvider,
};
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_backtest_on_series, BacktestResult, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<RunError>();
    }

    #[test]
    fn jobs_and_config_are_send_sync() {
        assert_send::<BatchJob>();
        assert_sync::<BatchJob>();
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<CsvProvider>();
        assert_sync::<CsvProvider>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
        assert_send::<CachedProvider<SyntheticProvider>>();
        assert_sync::<CachedProvider<SyntheticProvider>>();
        assert_send::<Box<dyn MarketDataProvider>>();
        assert_sync::<Box<dyn MarketDataProvider>>();
    }
}
