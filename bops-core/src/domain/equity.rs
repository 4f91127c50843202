//! EquityPoint — one sample of the equity curve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Equity at a bar's close: cash plus open-position mark-to-market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub bar_index: usize,
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Project an equity curve onto its values.
pub fn equity_values(curve: &[EquityPoint]) -> Vec<f64> {
    curve.iter().map(|p| p.equity).collect()
}
