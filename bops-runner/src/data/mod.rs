//! Market data: the provider trait, request type and structured errors.
//!
//! Providers turn a `DataRequest` into fully materialized bars. The core never
//! fetches anything itself; the runner resolves data here, validates it into a
//! `BarSeries`, and only then starts a simulation.
//!
//! "No data for range" is not an error: it is an empty bar list, which the
//! engine reports as a skipped run.

pub mod cache;
pub mod csv;
pub mod synthetic;
pub mod yahoo;

pub use self::cache::{CachedProvider, Clock, SystemClock};
pub use self::csv::CsvProvider;
pub use self::synthetic::SyntheticProvider;
pub use self::yahoo::YahooProvider;

use std::path::PathBuf;

use bops_core::domain::{Bar, BarError, BarSeries, Timeframe};
use chrono::{NaiveDate, Timelike};
use thiserror::Error;

use crate::config::DataSourceConfig;

/// What to fetch: one symbol over an inclusive date range at one interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timeframe: Timeframe,
}

impl DataRequest {
    pub fn new(
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            timeframe,
        }
    }

    /// Whether `bar` falls inside the requested date range.
    pub fn contains(&self, bar: &Bar) -> bool {
        let date = bar.timestamp.date_naive();
        date >= self.start && date <= self.end
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("invalid bars: {0}")]
    InvalidBars(#[from] BarError),

    #[error("data error: {0}")]
    Other(String),
}

/// Anything that can supply bars for a request.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for `request`, oldest first.
    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        (**self).fetch(request)
    }
}

/// Fetch and validate into a `BarSeries`.
///
/// Malformed bars (zero volume, inconsistent OHLC, duplicate timestamps) are
/// rejected here, before any simulation starts.
pub fn fetch_series(
    provider: &dyn MarketDataProvider,
    request: &DataRequest,
) -> Result<BarSeries, DataError> {
    let bars = provider.fetch(request)?;
    tracing::debug!(
        provider = provider.name(),
        symbol = %request.symbol,
        bars = bars.len(),
        "fetched bars"
    );
    Ok(BarSeries::new(request.symbol.clone(), bars)?)
}

/// Build the provider a config selects, wrapped in a one-hour cache.
pub fn build_provider(source: &DataSourceConfig) -> Result<Box<dyn MarketDataProvider>, DataError> {
    let provider: Box<dyn MarketDataProvider> = match source {
        DataSourceConfig::Yahoo => Box::new(CachedProvider::new(
            YahooProvider::new()?,
            cache::default_ttl(),
        )),
        DataSourceConfig::Csv { path } => Box::new(CsvProvider::new(path)),
        DataSourceConfig::Synthetic { seed } => Box::new(SyntheticProvider::new(*seed)),
    };
    Ok(provider)
}

/// Merge consecutive hourly bars into 4-hour bars within each UTC day.
///
/// Buckets start at 00:00, 04:00, ... UTC. Open is the first bar's open, close
/// the last bar's close, volume the sum; the bucket is stamped with its first bar.
pub fn resample_to_4h(bars: &[Bar]) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len() / 4 + 1);
    let mut current_key = None;

    for bar in bars {
        let key = (bar.timestamp.date_naive(), bar.timestamp.hour() / 4);
        match out.last_mut() {
            Some(agg) if current_key == Some(key) => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume = agg.volume.saturating_add(bar.volume);
            }
            _ => {
                out.push(bar.clone());
                current_key = Some(key);
            }
        }
    }
    out
}
