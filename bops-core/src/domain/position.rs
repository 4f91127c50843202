//! Position — the single open exposure of a run, with its bracket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// Position state as seen by signal policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl PositionSide {
    pub fn is_long(self) -> bool {
        self == PositionSide::Long
    }

    pub fn is_short(self) -> bool {
        self == PositionSide::Short
    }
}

impl From<Option<Side>> for PositionSide {
    fn from(side: Option<Side>) -> Self {
        match side {
            None => PositionSide::Flat,
            Some(Side::Long) => PositionSide::Long,
            Some(Side::Short) => PositionSide::Short,
        }
    }
}

/// Take-profit / stop-loss exit prices attached to a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub take_profit: f64,
    pub stop_loss: f64,
}

/// An open position. At most one exists per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub size: f64,
    pub bracket: Bracket,
    /// Breadth reading on the entry bar.
    pub entry_breadth: f64,
    /// Worst unrealized P&L seen while open (<= 0).
    pub mae: f64,
    /// Best unrealized P&L seen while open (>= 0).
    pub mfe: f64,
}

impl Position {
    /// Unrealized P&L when marked at `price` (before commission).
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.side.sign() * self.size
    }

    /// Track excursions across a bar's range.
    pub fn update_excursion(&mut self, high: f64, low: f64) {
        let (best, worst) = match self.side {
            Side::Long => (high, low),
            Side::Short => (low, high),
        };
        self.mfe = self.mfe.max(self.unrealized_pnl(best));
        self.mae = self.mae.min(self.unrealized_pnl(worst));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(side: Side) -> Position {
        Position {
            side,
            entry_bar: 3,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap(),
            entry_price: 100.0,
            size: 2.0,
            bracket: Bracket {
                take_profit: 101.5,
                stop_loss: 99.25,
            },
            entry_breadth: -1200.0,
            mae: 0.0,
            mfe: 0.0,
        }
    }

    #[test]
    fn unrealized_pnl_respects_direction() {
        assert_eq!(position(Side::Long).unrealized_pnl(103.0), 6.0);
        assert_eq!(position(Side::Short).unrealized_pnl(103.0), -6.0);
    }

    #[test]
    fn excursion_tracks_extremes() {
        let mut long = position(Side::Long);
        long.update_excursion(102.0, 99.0);
        long.update_excursion(101.0, 99.5);
        assert_eq!(long.mfe, 4.0);
        assert_eq!(long.mae, -2.0);

        let mut short = position(Side::Short);
        short.update_excursion(102.0, 99.0);
        assert_eq!(short.mfe, 2.0);
        assert_eq!(short.mae, -4.0);
    }

    #[test]
    fn position_side_from_option() {
        assert_eq!(PositionSide::from(None), PositionSide::Flat);
        assert_eq!(PositionSide::from(Some(Side::Short)), PositionSide::Short);
        assert!(PositionSide::Long.is_long());
        assert_eq!(Side::Long.opposite(), Side::Short);
    }
}
