//! Position & order manager — the single position, its bracket, and the trade log.
//!
//! State machine: `Flat → open → Long/Short → close → Flat`. Cash moves only
//! when a position closes (realized P&L net of round-trip commission); equity
//! is cash plus the open position's mark-to-market.

use super::config::{EngineConfig, RiskConfig};
use super::execution::{resolve_bracket, CostModel};
use crate::components::execution::{GapPolicy, PathPolicy};
use crate::domain::{Bar, Bracket, ExitReason, Position, PositionSide, Side, Trade};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PositionManager {
    risk: RiskConfig,
    cost: CostModel,
    size: f64,
    path_policy: PathPolicy,
    gap_policy: GapPolicy,
    cash: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
}

impl PositionManager {
    pub fn new(config: &EngineConfig, risk: &RiskConfig) -> Self {
        Self {
            risk: *risk,
            cost: CostModel::new(risk.commission_rate()),
            size: config.position_size,
            path_policy: config.path_policy,
            gap_policy: config.gap_policy,
            cash: config.initial_capital,
            position: None,
            trades: Vec::new(),
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn side(&self) -> PositionSide {
        PositionSide::from(self.position.as_ref().map(|p| p.side))
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Realized cash: initial capital plus every closed trade's net P&L.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus unrealized P&L of the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.unrealized_pnl(price))
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    // ── Entry ──

    /// Open a position at `bar.close` with its bracket attached.
    ///
    /// Returns `None` (and does nothing) if a position is already open.
    pub fn open(&mut self, side: Side, bar_index: usize, bar: &Bar, breadth: f64) -> Option<&Position> {
        debug_assert!(self.position.is_none(), "open() with a position already open");
        if self.position.is_some() {
            return None;
        }
        let entry_price = bar.close;
        let bracket = Bracket {
            take_profit: self.risk.take_profit_price(side, entry_price),
            stop_loss: self.risk.stop_loss_price(side, entry_price),
        };
        debug!(
            bar_index,
            ?side,
            entry_price,
            take_profit = bracket.take_profit,
            stop_loss = bracket.stop_loss,
            breadth,
            "position opened"
        );
        self.position = Some(Position {
            side,
            entry_bar: bar_index,
            entry_time: bar.timestamp,
            entry_price,
            size: self.size,
            bracket,
            entry_breadth: breadth,
            mae: 0.0,
            mfe: 0.0,
        });
        self.position.as_ref()
    }

    // ── Exit ──

    /// Check the open position's bracket against `bar` and close on a hit.
    ///
    /// Brackets are live from the bar after entry; on the entry bar itself
    /// this is a no-op.
    pub fn resolve_exits(&mut self, bar_index: usize, bar: &Bar) -> Option<&Trade> {
        let position = self.position.as_mut()?;
        if bar_index <= position.entry_bar {
            return None;
        }
        match resolve_bracket(position, bar, self.path_policy, self.gap_policy) {
            Some(exit) => {
                position.update_excursion(exit.price, exit.price);
                self.close(bar_index, bar, exit.price, exit.reason)
            }
            None => {
                position.update_excursion(bar.high, bar.low);
                None
            }
        }
    }

    /// Close the open position at `price`, realize P&L, append the trade.
    pub fn close(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        price: f64,
        reason: ExitReason,
    ) -> Option<&Trade> {
        let position = self.position.take()?;
        let gross_pnl = position.unrealized_pnl(price);
        let commission = self
            .cost
            .round_trip_commission(position.entry_price, price, position.size);
        let net_pnl = gross_pnl - commission;
        self.cash += net_pnl;

        debug!(
            bar_index,
            side = ?position.side,
            entry_price = position.entry_price,
            exit_price = price,
            %reason,
            net_pnl,
            "position closed"
        );

        self.trades.push(Trade {
            side: position.side,
            entry_bar: position.entry_bar,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            entry_breadth: position.entry_breadth,
            exit_bar: bar_index,
            exit_time: bar.timestamp,
            exit_price: price,
            exit_reason: reason,
            size: position.size,
            gross_pnl,
            commission,
            net_pnl,
            bars_held: bar_index - position.entry_bar,
            mae: position.mae,
            mfe: position.mfe,
        });
        self.trades.last()
    }
}
