//! Bar interval selection and its annualization constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Regular trading sessions per year used for annualization.
pub const SESSIONS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported timeframe '{0}' (expected 15m, 30m, 1h, 4h or 1d)")]
pub struct TimeframeParseError(pub String);

/// Supported bar intervals, from 15-minute to daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Interval label as used by market-data providers ("15m", "1h", ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub fn duration(self) -> chrono::Duration {
        match self {
            Timeframe::M15 => chrono::Duration::minutes(15),
            Timeframe::M30 => chrono::Duration::minutes(30),
            Timeframe::H1 => chrono::Duration::hours(1),
            Timeframe::H4 => chrono::Duration::hours(4),
            Timeframe::D1 => chrono::Duration::days(1),
        }
    }

    /// Bars in one regular 9:30-16:00 session (partial trailing bars count).
    pub fn bars_per_session(self) -> f64 {
        match self {
            Timeframe::M15 => 26.0,
            Timeframe::M30 => 13.0,
            Timeframe::H1 => 7.0,
            Timeframe::H4 => 2.0,
            Timeframe::D1 => 1.0,
        }
    }

    /// Default annualization base for per-bar return statistics.
    pub fn bars_per_year(self) -> f64 {
        SESSIONS_PER_YEAR * self.bars_per_session()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "15m" | "15min" => Ok(Timeframe::M15),
            "30m" | "30min" => Ok(Timeframe::M30),
            "1h" | "60m" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" | "d" | "daily" => Ok(Timeframe::D1),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}
