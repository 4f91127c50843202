//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single interval.
///
/// Bars are immutable once ingested into a [`BarSeries`](super::BarSeries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Rejection reasons for bars at ingestion time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index}: non-finite price")]
    NonFinitePrice { index: usize },

    #[error("bar {index}: prices must be positive")]
    NonPositivePrice { index: usize },

    #[error("bar {index}: OHLC inconsistent (low <= open, close <= high violated)")]
    OhlcInconsistent { index: usize },

    #[error("bar {index}: zero volume")]
    ZeroVolume { index: usize },

    #[error("bar {index}: timestamp {timestamp} does not increase over the previous bar")]
    NonIncreasingTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check a single bar's OHLCV fields. `index` is only used for the error.
    pub fn validate(&self, index: usize) -> Result<(), BarError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(BarError::NonFinitePrice { index });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(BarError::NonPositivePrice { index });
        }
        if !self.is_sane() {
            return Err(BarError::OhlcInconsistent { index });
        }
        if self.volume == 0 {
            return Err(BarError::ZeroVolume { index });
        }
        Ok(())
    }

    /// Basic OHLC sanity check: `low <= {open, close} <= high`.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Whether `price` lies inside this bar's `[low, high]` range.
    pub fn reaches(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}
