//! Trade — a closed position with realized P&L.

use super::position::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    SignalReversal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::SignalReversal => "signal_reversal",
            ExitReason::EndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

/// A complete round trip: entry → exit. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_breadth: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    pub size: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    /// Realized P&L after commission.
    pub net_pnl: f64,

    pub bars_held: usize,
    pub mae: f64,
    pub mfe: f64,
}

impl Trade {
    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional == 0.0 {
            return 0.0;
        }
        self.net_pnl / notional
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> Trade {
        Trade {
            side: Side::Long,
            entry_bar: 5,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap(),
            entry_price: 100.0,
            entry_breadth: -1100.0,
            exit_bar: 6,
            exit_time: Utc.with_ymd_and_hms(2024, 1, 2, 16, 30, 0).unwrap(),
            exit_price: 101.5,
            exit_reason: ExitReason::TakeProfit,
            size: 10.0,
            gross_pnl: 15.0,
            commission: 0.403,
            net_pnl: 14.597,
            bars_held: 1,
            mae: 0.0,
            mfe: 15.0,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        assert!((trade.return_pct() - 14.597 / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = 0.0;
        assert!(!loser.is_winner());
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::StopLoss.to_string(), "stop_loss");
        assert_eq!(ExitReason::EndOfData.to_string(), "end_of_data");
    }
}
