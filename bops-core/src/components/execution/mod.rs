//! Execution policies — how bracket exits are filled from OHLC alone.
//!
//! A bar only tells us its open, extremes and close, not the order in which
//! prices printed. The path policy decides which bracket fills when a bar's
//! range spans both; the gap policy decides the fill price when the bar opens
//! beyond a bracket.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// Intrabar path policy for resolving ambiguous bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPolicy {
    /// Adversarial: assume the stop-loss printed first (default).
    #[default]
    WorstCase,
    /// Optimistic: assume the take-profit printed first.
    BestCase,
    /// Infer the path from the open's distance to high and low.
    Deterministic,
}

/// Inferred intrabar path for `Deterministic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarPath {
    /// Open → High → Low → Close.
    HighFirst,
    /// Open → Low → High → Close.
    LowFirst,
}

impl BarPath {
    /// If |open - high| <= |open - low| the high was reached first.
    pub fn infer(bar: &Bar) -> Self {
        if (bar.open - bar.high).abs() <= (bar.open - bar.low).abs() {
            BarPath::HighFirst
        } else {
            BarPath::LowFirst
        }
    }
}

/// Fill price when a bar gaps through a bracket at the open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fill at the bracket price (default).
    #[default]
    FillAtTrigger,
    /// Fill at the open, the first price actually available.
    FillAtOpen,
}
