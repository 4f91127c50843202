//! BarSeries — an immutable, validated, time-ordered sequence of bars.

use super::bar::{Bar, BarError};
use thiserror::Error;

/// Caller contract violations when reading from a series or its indicators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar index {index} out of range for series of {len} bars")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("indicator '{name}' not ready at bar {index} (warm-up)")]
    IndicatorNotReady { name: String, index: usize },

    #[error("indicator '{name}' was never computed for this series")]
    UnknownIndicator { name: String },
}

/// Ordered bars indexed `0..N` by arrival order.
///
/// Construction validates every bar and the strict monotonicity of timestamps,
/// so nothing downstream re-checks or coerces bar data mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate(i)?;
            if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
                return Err(BarError::NonIncreasingTimestamp {
                    index: i,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// A series with no bars ("no data for range").
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bar `i`, or `IndexOutOfRange`.
    pub fn at(&self, index: usize) -> Result<&Bar, SeriesError> {
        self.bars.get(index).ok_or(SeriesError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Content hash of the bar data (BLAKE3, hex).
    ///
    /// Two series with identical bars hash identically regardless of symbol.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(n: usize) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(base + Duration::hours(i as i64), c, c + 1.0, c - 1.0, c, 1000)
            })
            .collect()
    }

    #[test]
    fn at_returns_bar_or_out_of_range() {
        let series = BarSeries::new("MNQ=F", bars(3)).unwrap();
        assert_eq!(series.at(2).unwrap().close, 102.0);
        assert_eq!(
            series.at(3),
            Err(SeriesError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let mut b = bars(3);
        b[2].timestamp = b[1].timestamp;
        let err = BarSeries::new("MNQ=F", b).unwrap_err();
        assert!(matches!(err, BarError::NonIncreasingTimestamp { index: 2, .. }));
    }

    #[test]
    fn rejects_invalid_bar_with_its_index() {
        let mut b = bars(5);
        b[4].volume = 0;
        assert_eq!(
            BarSeries::new("MNQ=F", b).unwrap_err(),
            BarError::ZeroVolume { index: 4 }
        );
    }

    #[test]
    fn empty_series() {
        let series = BarSeries::empty("MES=F");
        assert!(series.is_empty());
        assert_eq!(series.symbol(), "MES=F");
        assert!(series.last().is_none());
    }

    #[test]
    fn dataset_hash_is_content_based() {
        let a = BarSeries::new("A", bars(10)).unwrap();
        let b = BarSeries::new("B", bars(10)).unwrap();
        let c = BarSeries::new("A", bars(11)).unwrap();
        assert_eq!(a.dataset_hash(), b.dataset_hash());
        assert_ne!(a.dataset_hash(), c.dataset_hash());
    }
}
