//! Indicator trait and the per-series indicator cache.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! The cache computes each requested series once, keyed by indicator and
//! parameters, and serves per-bar lookups during the loop. No recomputation
//! on each bar.

use crate::domain::{Bar, BarSeries, SeriesError};
use crate::indicators::{Atr, Sma, VolumeMean};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warm-up).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Identity of a derived series: indicator kind plus its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "window", rename_all = "snake_case")]
pub enum IndicatorKey {
    /// SMA of close.
    Sma(usize),
    /// Rolling mean of volume.
    VolumeMean(usize),
    /// Wilder ATR.
    Atr(usize),
}

impl IndicatorKey {
    pub fn build(self) -> Box<dyn Indicator> {
        match self {
            IndicatorKey::Sma(w) => Box::new(Sma::new(w)),
            IndicatorKey::VolumeMean(w) => Box::new(VolumeMean::new(w)),
            IndicatorKey::Atr(w) => Box::new(Atr::new(w)),
        }
    }

    pub fn lookback(self) -> usize {
        match self {
            IndicatorKey::Sma(w) | IndicatorKey::VolumeMean(w) => w.saturating_sub(1),
            IndicatorKey::Atr(w) => w,
        }
    }

    pub fn window(self) -> usize {
        match self {
            IndicatorKey::Sma(w) | IndicatorKey::VolumeMean(w) | IndicatorKey::Atr(w) => w,
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::Sma(w) => write!(f, "sma_{w}"),
            IndicatorKey::VolumeMean(w) => write!(f, "volume_mean_{w}"),
            IndicatorKey::Atr(w) => write!(f, "atr_{w}"),
        }
    }
}

/// Memoized indicator series for one `BarSeries`, aligned 1:1 with its bars.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCache {
    series: HashMap<IndicatorKey, Vec<f64>>,
    len: usize,
}

impl IndicatorCache {
    /// Precompute every key in `keys` over `series`. Duplicates are computed once.
    pub fn build(series: &BarSeries, keys: &[IndicatorKey]) -> Self {
        let mut cache = Self {
            series: HashMap::new(),
            len: series.len(),
        };
        for &key in keys {
            cache.ensure(series, key);
        }
        cache
    }

    /// Compute `key` if it is not cached yet and return its full series.
    pub fn ensure(&mut self, series: &BarSeries, key: IndicatorKey) -> &[f64] {
        debug_assert_eq!(self.len, series.len(), "cache built for another series");
        self.series.entry(key).or_insert_with(|| {
            let values = key.build().compute(series.bars());
            debug_assert_eq!(values.len(), series.len());
            values
        })
    }

    /// Value at `index`, or `None` while warming up / unknown / out of range.
    pub fn get(&self, key: IndicatorKey, index: usize) -> Option<f64> {
        self.series
            .get(&key)
            .and_then(|v| v.get(index).copied())
            .filter(|v| !v.is_nan())
    }

    /// Value at `index`, or the contract violation explaining why not.
    pub fn require(&self, key: IndicatorKey, index: usize) -> Result<f64, SeriesError> {
        let values = self
            .series
            .get(&key)
            .ok_or_else(|| SeriesError::UnknownIndicator {
                name: key.to_string(),
            })?;
        let value = values.get(index).copied().ok_or(SeriesError::IndexOutOfRange {
            index,
            len: self.len,
        })?;
        if value.is_nan() {
            return Err(SeriesError::IndicatorNotReady {
                name: key.to_string(),
                index,
            });
        }
        Ok(value)
    }

    pub fn is_ready(&self, key: IndicatorKey, index: usize) -> bool {
        self.get(key, index).is_some()
    }

    pub fn get_series(&self, key: IndicatorKey) -> Option<&[f64]> {
        self.series.get(&key).map(|v| v.as_slice())
    }

    /// Largest lookback across cached indicators.
    pub fn warmup(&self) -> usize {
        self.series.keys().map(|k| k.lookback()).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
