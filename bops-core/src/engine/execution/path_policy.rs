//! Bracket resolution — which of TP/SL a bar triggers, and at what price.
//!
//! A bracket is triggered when the bar trades through it: for a long,
//! `high >= take_profit` or `low <= stop_loss`; for a short the mirror. When a
//! single bar triggers both, the path policy picks one.

use crate::components::execution::{BarPath, GapPolicy, PathPolicy};
use crate::domain::{Bar, ExitReason, Position, Side};

/// A bracket fill on this bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketExit {
    pub reason: ExitReason,
    pub price: f64,
}

fn tp_triggered(side: Side, take_profit: f64, bar: &Bar) -> bool {
    match side {
        Side::Long => bar.high >= take_profit,
        Side::Short => bar.low <= take_profit,
    }
}

fn sl_triggered(side: Side, stop_loss: f64, bar: &Bar) -> bool {
    match side {
        Side::Long => bar.low <= stop_loss,
        Side::Short => bar.high >= stop_loss,
    }
}

/// True when the bar opened at or beyond `level` in the direction the bracket
/// fires: above for a long TP / short SL, below for a long SL / short TP.
fn opened_beyond(side: Side, reason: ExitReason, level: f64, bar: &Bar) -> bool {
    let upward = matches!(
        (side, reason),
        (Side::Long, ExitReason::TakeProfit) | (Side::Short, ExitReason::StopLoss)
    );
    if upward {
        bar.open >= level
    } else {
        bar.open <= level
    }
}

/// Which bracket fills first when both trigger on one bar.
fn first_of_both(side: Side, position: &Position, bar: &Bar, policy: PathPolicy) -> ExitReason {
    let b = position.bracket;
    match policy {
        PathPolicy::WorstCase => ExitReason::StopLoss,
        PathPolicy::BestCase => ExitReason::TakeProfit,
        PathPolicy::Deterministic => {
            // An open already beyond a level means that level printed first.
            if opened_beyond(side, ExitReason::StopLoss, b.stop_loss, bar) {
                return ExitReason::StopLoss;
            }
            if opened_beyond(side, ExitReason::TakeProfit, b.take_profit, bar) {
                return ExitReason::TakeProfit;
            }
            let high_first = BarPath::infer(bar) == BarPath::HighFirst;
            match (side, high_first) {
                (Side::Long, true) | (Side::Short, false) => ExitReason::TakeProfit,
                (Side::Long, false) | (Side::Short, true) => ExitReason::StopLoss,
            }
        }
    }
}

/// Resolve the position's bracket against `bar`.
///
/// Returns `None` when neither level traded. The fill price is the bracket
/// level, or the open under `GapPolicy::FillAtOpen` if the bar gapped through.
pub fn resolve_bracket(
    position: &Position,
    bar: &Bar,
    path_policy: PathPolicy,
    gap_policy: GapPolicy,
) -> Option<BracketExit> {
    let side = position.side;
    let b = position.bracket;
    let tp = tp_triggered(side, b.take_profit, bar);
    let sl = sl_triggered(side, b.stop_loss, bar);

    let reason = match (tp, sl) {
        (false, false) => return None,
        (true, false) => ExitReason::TakeProfit,
        (false, true) => ExitReason::StopLoss,
        (true, true) => first_of_both(side, position, bar, path_policy),
    };
    let level = match reason {
        ExitReason::TakeProfit => b.take_profit,
        _ => b.stop_loss,
    };
    let price = match gap_policy {
        GapPolicy::FillAtOpen if opened_beyond(side, reason, level, bar) => bar.open,
        _ => level,
    };
    Some(BracketExit { reason, price })
}
