//! Run outcome types.

use crate::domain::{EquityPoint, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a run did not simulate anything. Reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The series has zero bars ("no data for range").
    EmptySeries,
    /// Fewer bars than the strategy needs before its first evaluation.
    InsufficientWarmup { bars: usize, required: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptySeries => f.write_str("empty series"),
            SkipReason::InsufficientWarmup { bars, required } => {
                write!(f, "insufficient warm-up: {bars} bars, {required} required")
            }
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub symbol: String,
    pub strategy: String,
    pub breadth_source: String,
    pub initial_capital: f64,
    /// Bars before the first signal evaluation.
    pub warmup_bars: usize,
    /// One point per bar, in bar order.
    pub equity_curve: Vec<EquityPoint>,
    /// Closed trades in exit order.
    pub trades: Vec<Trade>,
}

impl RunResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.equity)
    }

    pub fn bar_count(&self) -> usize {
        self.equity_curve.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

/// Result of `run`: either a completed simulation or the reason it could not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunResult),
    Skipped(SkipReason),
}

impl RunOutcome {
    pub fn completed(&self) -> Option<&RunResult> {
        match self {
            RunOutcome::Completed(r) => Some(r),
            RunOutcome::Skipped(_) => None,
        }
    }

    pub fn into_completed(self) -> Option<RunResult> {
        match self {
            RunOutcome::Completed(r) => Some(r),
            RunOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            RunOutcome::Completed(_) => None,
            RunOutcome::Skipped(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_display() {
        let r = SkipReason::InsufficientWarmup {
            bars: 5,
            required: 20,
        };
        assert_eq!(r.to_string(), "insufficient warm-up: 5 bars, 20 required");
    }

    #[test]
    fn empty_result_final_equity_is_initial() {
        let r = RunResult {
            symbol: "MNQ=F".into(),
            strategy: "bar_pattern_20".into(),
            breadth_source: "constant".into(),
            initial_capital: 10_000.0,
            warmup_bars: 19,
            equity_curve: Vec::new(),
            trades: Vec::new(),
        };
        assert_eq!(r.final_equity(), 10_000.0);
        let outcome = RunOutcome::Completed(r);
        assert!(outcome.completed().is_some());
        assert_eq!(outcome.skip_reason(), None);
    }
}
