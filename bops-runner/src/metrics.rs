//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Percent-valued metrics are in percent units (12.5 means 12.5 %). Degenerate
//! inputs (no trades, flat or empty equity) yield 0.0, never NaN.

use bops_core::domain::{equity_values, BarSeries, Trade};
use bops_core::engine::RunResult;
use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // ── Headline ──
    pub total_return_pct: f64,
    pub sharpe: f64,
    pub win_rate_pct: f64,
    pub trade_count: usize,

    // ── Equity ──
    pub final_equity: f64,
    pub peak_equity: f64,
    pub max_drawdown_pct: f64,
    pub sortino: f64,
    pub exposure_pct: f64,
    pub buy_and_hold_pct: f64,

    // ── Trades ──
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_trade_pct: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from an equity curve and trade list.
    ///
    /// `bars_per_year` annualizes the per-bar Sharpe and Sortino ratios.
    /// Buy-and-hold needs the price series; see [`PerformanceMetrics::from_run`].
    pub fn compute(
        equity_curve: &[f64],
        trades: &[Trade],
        initial_capital: f64,
        bars_per_year: f64,
    ) -> Self {
        Self {
            total_return_pct: total_return_pct(equity_curve, initial_capital),
            sharpe: sharpe_ratio(equity_curve, bars_per_year),
            win_rate_pct: win_rate_pct(trades),
            trade_count: trades.len(),
            final_equity: equity_curve.last().copied().unwrap_or(initial_capital),
            peak_equity: peak_equity(equity_curve, initial_capital),
            max_drawdown_pct: max_drawdown_pct(equity_curve, initial_capital),
            sortino: sortino_ratio(equity_curve, bars_per_year),
            exposure_pct: exposure_pct(trades, equity_curve.len()),
            buy_and_hold_pct: 0.0,
            best_trade_pct: best_trade_pct(trades),
            worst_trade_pct: worst_trade_pct(trades),
            avg_trade_pct: avg_trade_pct(trades),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
        }
    }

    /// Metrics for a completed run, including buy-and-hold over `series`.
    pub fn from_run(result: &RunResult, series: &BarSeries, bars_per_year: f64) -> Self {
        let equity = equity_values(&result.equity_curve);
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        Self {
            buy_and_hold_pct: buy_and_hold_pct(&closes),
            ..Self::compute(&equity, &result.trades, result.initial_capital, bars_per_year)
        }
    }
}

// ─── Headline metrics ───────────────────────────────────────────────

/// Total return in percent: (final / initial - 1) × 100.
pub fn total_return_pct(equity_curve: &[f64], initial_capital: f64) -> f64 {
    let Some(&final_eq) = equity_curve.last() else {
        return 0.0;
    };
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_eq / initial_capital - 1.0) * 100.0
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(per-bar returns) / std(per-bar returns) × sqrt(bars_per_year).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 || bars_per_year <= 0.0 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * bars_per_year.sqrt()
}

/// Win rate in percent; 0.0 with no trades.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

// ─── Equity metrics ─────────────────────────────────────────────────

pub fn peak_equity(equity_curve: &[f64], initial_capital: f64) -> f64 {
    equity_curve.iter().copied().fold(initial_capital, f64::max)
}

/// Maximum drawdown in percent, as a negative number (-15.0 = 15 % drawdown).
///
/// The running peak starts at the initial capital.
pub fn max_drawdown_pct(equity_curve: &[f64], initial_capital: f64) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd * 100.0
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside deviation or fewer than 2 returns.
pub fn sortino_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 || bars_per_year <= 0.0 {
        return 0.0;
    }
    let mean = mean_f64(&returns);

    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return 0.0;
    }

    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * bars_per_year.sqrt()
}

/// Share of bars with an open position, in percent.
///
/// A trade occupies the bars after its entry bar up to and including its exit bar.
pub fn exposure_pct(trades: &[Trade], bar_count: usize) -> f64 {
    if bar_count == 0 {
        return 0.0;
    }
    let held: usize = trades.iter().map(|t| t.bars_held).sum();
    (held as f64 / bar_count as f64 * 100.0).min(100.0)
}

/// Return of holding one unit from the first close to the last close, in percent.
pub fn buy_and_hold_pct(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if closes.len() >= 2 && first > 0.0 => {
            (last / first - 1.0) * 100.0
        }
        _ => 0.0,
    }
}

// ─── Trade metrics ──────────────────────────────────────────────────

pub fn best_trade_pct(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.return_pct() * 100.0)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

pub fn worst_trade_pct(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .map(|t| t.return_pct() * 100.0)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

pub fn avg_trade_pct(trades: &[Trade]) -> f64 {
    let returns: Vec<f64> = trades.iter().map(|t| t.return_pct() * 100.0).collect();
    mean_f64(&returns)
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Mean realized P&L per trade, in account currency.
pub fn expectancy(trades: &[Trade]) -> f64 {
    let pnls: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
    mean_f64(&pnls)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity points.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bops_core::domain::{ExitReason, Side};
    use chrono::{TimeZone, Utc};

    fn make_trade(net_pnl: f64) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        Trade {
            side: Side::Long,
            entry_bar: 0,
            entry_time: t,
            entry_price: 100.0,
            entry_breadth: -1200.0,
            exit_bar: 5,
            exit_time: t,
            exit_price: 100.0 + net_pnl,
            exit_reason: ExitReason::EndOfData,
            size: 1.0,
            gross_pnl: net_pnl,
            commission: 0.0,
            net_pnl,
            bars_held: 5,
            mae: 0.0,
            mfe: 0.0,
        }
    }

    #[test]
    fn total_return_from_initial_capital() {
        let eq = [10_000.0, 10_500.0, 11_000.0];
        assert!((total_return_pct(&eq, 10_000.0) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn total_return_empty_curve() {
        assert_eq!(total_return_pct(&[], 10_000.0), 0.0);
    }

    #[test]
    fn sharpe_flat_equity_is_zero() {
        let eq = vec![10_000.0; 50];
        assert_eq!(sharpe_ratio(&eq, 252.0), 0.0);
    }

    #[test]
    fn sharpe_scales_with_bars_per_year() {
        let eq: Vec<f64> = (0..100)
            .map(|i| 10_000.0 + i as f64 * 10.0 + if i % 2 == 0 { 5.0 } else { 0.0 })
            .collect();
        let daily = sharpe_ratio(&eq, 252.0);
        let hourly = sharpe_ratio(&eq, 252.0 * 7.0);
        assert!(daily > 0.0);
        assert!((hourly / daily - 7.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn win_rate_no_trades_is_zero() {
        assert_eq!(win_rate_pct(&[]), 0.0);
    }

    #[test]
    fn win_rate_counts_positive_pnl() {
        let trades = vec![make_trade(1.0), make_trade(-1.0), make_trade(0.0), make_trade(2.0)];
        assert!((win_rate_pct(&trades) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_negative_percent() {
        let eq = [10_000.0, 11_000.0, 9_900.0, 10_500.0];
        assert!((max_drawdown_pct(&eq, 10_000.0) - (-10.0)).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        let eq = [10_000.0, 10_100.0, 10_200.0];
        assert_eq!(max_drawdown_pct(&eq, 10_000.0), 0.0);
    }

    #[test]
    fn peak_equity_includes_initial() {
        assert_eq!(peak_equity(&[9_000.0, 9_500.0], 10_000.0), 10_000.0);
        assert_eq!(peak_equity(&[], 10_000.0), 10_000.0);
    }

    #[test]
    fn sortino_without_losses_is_zero() {
        let eq = [100.0, 101.0, 102.0, 103.0];
        assert_eq!(sortino_ratio(&eq, 252.0), 0.0);
    }

    #[test]
    fn exposure_counts_held_bars() {
        let trades = vec![make_trade(1.0), make_trade(-1.0)];
        assert!((exposure_pct(&trades, 20) - 50.0).abs() < 1e-10);
        assert_eq!(exposure_pct(&trades, 0), 0.0);
    }

    #[test]
    fn buy_and_hold_first_to_last_close() {
        assert!((buy_and_hold_pct(&[100.0, 90.0, 110.0]) - 10.0).abs() < 1e-10);
        assert_eq!(buy_and_hold_pct(&[100.0]), 0.0);
        assert_eq!(buy_and_hold_pct(&[]), 0.0);
    }

    #[test]
    fn trade_extremes_and_average() {
        let trades = vec![make_trade(2.0), make_trade(-1.0), make_trade(0.5)];
        assert!((best_trade_pct(&trades) - 2.0).abs() < 1e-10);
        assert!((worst_trade_pct(&trades) - (-1.0)).abs() < 1e-10);
        assert!((avg_trade_pct(&trades) - 0.5).abs() < 1e-10);
        assert!((expectancy(&trades) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn trade_metrics_without_trades_are_zero() {
        assert_eq!(best_trade_pct(&[]), 0.0);
        assert_eq!(worst_trade_pct(&[]), 0.0);
        assert_eq!(avg_trade_pct(&[]), 0.0);
        assert_eq!(expectancy(&[]), 0.0);
        assert_eq!(profit_factor(&[]), 0.0);
    }

    #[test]
    fn profit_factor_all_winners_capped() {
        let trades = vec![make_trade(100.0), make_trade(50.0)];
        assert_eq!(profit_factor(&trades), 100.0);
    }

    #[test]
    fn profit_factor_mixed() {
        let trades = vec![make_trade(300.0), make_trade(-100.0)];
        assert!((profit_factor(&trades) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn compute_never_produces_nan() {
        let m = PerformanceMetrics::compute(&[], &[], 10_000.0, 1764.0);
        assert_eq!(m.final_equity, 10_000.0);
        for v in [
            m.total_return_pct,
            m.sharpe,
            m.win_rate_pct,
            m.max_drawdown_pct,
            m.sortino,
            m.exposure_pct,
            m.profit_factor,
            m.expectancy,
        ] {
            assert_eq!(v, 0.0);
        }
        assert_eq!(m.trade_count, 0);
    }

    #[test]
    fn compute_does_not_mutate_inputs() {
        let eq = vec![10_000.0, 10_100.0, 10_050.0];
        let trades = vec![make_trade(50.0)];
        let before = (eq.clone(), trades.clone());
        let _ = PerformanceMetrics::compute(&eq, &trades, 10_000.0, 252.0);
        assert_eq!((eq, trades), before);
    }
}
