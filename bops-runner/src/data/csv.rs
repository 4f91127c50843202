//! CSV import provider.
//!
//! Expects a header row with `timestamp,open,high,low,close,volume`. Timestamps
//! may be RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare `YYYY-MM-DD` date.
//! Volume must be a whole number; `1500.0` is read as 1500.
//! One file holds one instrument; the request's symbol is not checked.

use std::path::{Path, PathBuf};

use bops_core::domain::Bar;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use super::{DataError, DataRequest, MarketDataProvider};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads bars from a local CSV file, filtered to the requested date range.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every row of the file, unfiltered.
    pub fn read_all(&self) -> Result<Vec<Bar>, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_bars(file)
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        let bars = self.read_all()?;
        Ok(bars.into_iter().filter(|b| request.contains(b)).collect())
    }
}

/// Parse CSV bars from any reader.
pub fn parse_bars<R: std::io::Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        // Row numbers are 1-based and count the header.
        let row_no = i + 2;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| DataError::InvalidRow {
            row: row_no,
            reason: format!("unrecognized timestamp '{}'", row.timestamp),
        })?;
        let volume = whole_volume(row.volume).ok_or_else(|| DataError::InvalidRow {
            row: row_no,
            reason: format!("volume {} is not a non-negative integer", row.volume),
        })?;
        bars.push(Bar::new(timestamp, row.open, row.high, row.low, row.close, volume));
    }
    Ok(bars)
}

/// `1500` and `1500.0` are accepted; fractional, negative and
/// out-of-range values are not.
fn whole_volume(v: f64) -> Option<u64> {
    // 2^64, the first value past u64::MAX.
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < LIMIT {
        Some(v as u64)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
