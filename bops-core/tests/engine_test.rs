//! Integration tests for the simulation loop.
//!
//! Tests:
//! 1. Scenarios: flat series, take-profit, end-of-data, worst-case stop
//! 2. Equity curve shape: one point per bar, flat during warm-up
//! 3. Strategy variants: bar pattern and SMA crossover through the same loop
//! 4. Determinism: identical inputs give byte-identical outputs

use bops_core::components::breadth::{ConstantBreadth, FixedBreadth, SeededBreadth};
use bops_core::components::execution::{GapPolicy, PathPolicy};
use bops_core::components::factory::{create_signal, StrategyVariant};
use bops_core::components::signal::{BarPattern, SignalPolicy, SmaCrossover};
use bops_core::domain::{Bar, BarSeries, ExitReason, Side};
use bops_core::engine::{run, EngineConfig, RiskConfig, RunOutcome, RunResult, SkipReason};
use chrono::{DateTime, Duration, TimeZone, Utc};

const EPS: f64 = 1e-9;

fn t(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap() + Duration::hours(i as i64)
}

fn quiet(i: usize, price: f64) -> Bar {
    Bar::new(t(i), price, price + 0.2, price - 0.2, price, 1000)
}

/// Five quiet bars at 100, then a bullish bar 5 closing at 101 on twice the
/// preceding volume, then `after` bars.
fn long_setup(after: Vec<(f64, f64, f64, f64)>) -> BarSeries {
    let mut bars: Vec<Bar> = (0..5).map(|i| quiet(i, 100.0)).collect();
    bars.push(Bar::new(t(5), 100.0, 101.1, 99.9, 101.0, 2000));
    for (k, (o, h, l, c)) in after.into_iter().enumerate() {
        bars.push(Bar::new(t(6 + k), o, h, l, c, 1000));
    }
    BarSeries::new("MNQ=F", bars).unwrap()
}

fn long_breadth(len: usize) -> FixedBreadth {
    let risk = RiskConfig::default();
    FixedBreadth::with_overrides(len, 0.0, &[(5, risk.low_threshold() - 1.0)])
}

fn completed(outcome: RunOutcome) -> RunResult {
    match outcome {
        RunOutcome::Completed(r) => r,
        RunOutcome::Skipped(reason) => panic!("expected a completed run, got {reason}"),
    }
}

fn run_default(series: &BarSeries, breadth: &FixedBreadth, config: &EngineConfig) -> RunResult {
    completed(
        run(
            series,
            &BarPattern::new(5),
            breadth,
            &RiskConfig::default(),
            config,
        )
        .unwrap(),
    )
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn flat_series_yields_no_trades_and_flat_equity() {
    let series = BarSeries::new("MNQ=F", (0..10).map(|i| quiet(i, 100.0)).collect()).unwrap();
    // Extreme readings on every bar; flat bars are neither bullish nor bearish.
    let result = completed(
        run(
            &series,
            &BarPattern::new(5),
            &SeededBreadth::new(3),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap(),
    );

    assert!(result.trades.is_empty());
    assert_eq!(result.equity_curve.len(), 10);
    assert!(result.equity_curve.iter().all(|p| p.equity == 10_000.0));
}

#[test]
fn flat_series_with_default_window_is_skipped_not_failed() {
    let series = BarSeries::new("MNQ=F", (0..10).map(|i| quiet(i, 100.0)).collect()).unwrap();
    let outcome = run(
        &series,
        &BarPattern::default(),
        &ConstantBreadth(0.0),
        &RiskConfig::default(),
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Skipped(SkipReason::InsufficientWarmup {
            bars: 10,
            required: 20
        })
    );
}

fn flat_run(n: usize, policy: &dyn SignalPolicy) -> RunOutcome {
    let series = BarSeries::new("MNQ=F", (0..n).map(|i| quiet(i, 100.0)).collect()).unwrap();
    run(
        &series,
        policy,
        &ConstantBreadth(-1200.0),
        &RiskConfig::default(),
        &EngineConfig::default(),
    )
    .unwrap()
}

#[test]
fn series_exactly_one_window_long_runs_with_zero_trades() {
    for policy in [
        Box::new(BarPattern::new(20)) as Box<dyn SignalPolicy>,
        Box::new(SmaCrossover::new(20, 20)),
    ] {
        let result = completed(flat_run(20, policy.as_ref()));
        assert_eq!(result.equity_curve.len(), 20, "{}", policy.name());
        assert!(result.trades.is_empty(), "{}", policy.name());
        assert!(result.equity_curve.iter().all(|p| p.equity == 10_000.0));
    }
}

#[test]
fn series_shorter_than_window_is_skipped_for_both_policies() {
    for policy in [
        Box::new(BarPattern::new(20)) as Box<dyn SignalPolicy>,
        Box::new(SmaCrossover::new(20, 20)),
    ] {
        assert_eq!(
            flat_run(19, policy.as_ref()),
            RunOutcome::Skipped(SkipReason::InsufficientWarmup {
                bars: 19,
                required: 20
            }),
            "{}",
            policy.name()
        );
    }
}

#[test]
fn take_profit_hit_on_next_bar() {
    // Entry at 101: TP = 102.515, SL = 100.2425.
    let series = long_setup(vec![
        (101.2, 102.8, 101.0, 102.6),
        (102.6, 102.8, 102.4, 102.6),
        (102.6, 102.8, 102.4, 102.6),
        (102.6, 102.8, 102.4, 102.6),
    ]);
    let result = run_default(&series, &long_breadth(10), &EngineConfig::default());

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.entry_bar, 5);
    assert_eq!(trade.entry_price, 101.0);
    assert_eq!(trade.entry_breadth, -1001.0);
    assert_eq!(trade.exit_bar, 6);
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    assert!((trade.exit_price - 102.515).abs() < EPS);

    let commission = 0.0002 * (101.0 + trade.exit_price);
    assert!((trade.commission - commission).abs() < EPS);
    assert!((trade.net_pnl - (trade.exit_price - 101.0 - commission)).abs() < EPS);

    // Entry bar is marked at its own close: no change yet.
    assert_eq!(result.equity_curve[5].equity, 10_000.0);
    let after = 10_000.0 + trade.net_pnl;
    for p in &result.equity_curve[6..] {
        assert!((p.equity - after).abs() < EPS);
    }
}

#[test]
fn open_position_closed_at_end_of_data() {
    let series = long_setup(vec![
        (101.0, 101.6, 100.6, 101.4),
        (101.4, 101.8, 101.0, 101.2),
        (101.2, 101.5, 100.9, 101.3),
    ]);
    let result = run_default(&series, &long_breadth(9), &EngineConfig::default());

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    assert_eq!(trade.exit_bar, 8);
    assert_eq!(trade.exit_price, 101.3);
    assert_eq!(trade.bars_held, 3);

    // Equity on bars 6 and 7 is marked to market.
    assert!((result.equity_curve[6].equity - 10_000.4).abs() < EPS);
    assert!((result.equity_curve[7].equity - 10_000.2).abs() < EPS);
    // Final equity is cash after the forced close.
    assert!((result.final_equity() - (10_000.0 + trade.net_pnl)).abs() < EPS);
}

#[test]
fn bar_spanning_both_brackets_exits_at_stop() {
    let wide = vec![(101.0, 103.0, 100.0, 102.9), (102.9, 103.0, 102.8, 102.9)];

    let worst = run_default(&long_setup(wide.clone()), &long_breadth(8), &EngineConfig::default());
    assert_eq!(worst.trades.len(), 1);
    assert_eq!(worst.trades[0].exit_reason, ExitReason::StopLoss);
    assert!((worst.trades[0].exit_price - 100.2425).abs() < EPS);
    assert!(worst.trades[0].net_pnl < 0.0);

    let best = run_default(
        &long_setup(wide),
        &long_breadth(8),
        &EngineConfig::default().with_path_policy(PathPolicy::BestCase),
    );
    assert_eq!(best.trades[0].exit_reason, ExitReason::TakeProfit);
}

#[test]
fn gap_below_stop_fills_at_open_when_configured() {
    let gap = vec![(99.5, 99.8, 99.2, 99.6), (99.6, 99.8, 99.4, 99.6)];
    let at_open = run_default(
        &long_setup(gap.clone()),
        &long_breadth(8),
        &EngineConfig::default().with_gap_policy(GapPolicy::FillAtOpen),
    );
    assert_eq!(at_open.trades[0].exit_reason, ExitReason::StopLoss);
    assert_eq!(at_open.trades[0].exit_price, 99.5);

    let at_trigger = run_default(&long_setup(gap), &long_breadth(8), &EngineConfig::default());
    assert!((at_trigger.trades[0].exit_price - 100.2425).abs() < EPS);
}

#[test]
fn short_entry_on_high_breadth_bearish_bar() {
    let mut bars: Vec<Bar> = (0..5).map(|i| quiet(i, 100.0)).collect();
    bars.push(Bar::new(t(5), 100.0, 100.1, 98.9, 99.0, 2000));
    // Short entry 99: TP = 97.515, SL = 99.7425.
    bars.push(Bar::new(t(6), 98.8, 98.9, 97.4, 97.6, 1000));
    bars.push(quiet(7, 97.6));
    let series = BarSeries::new("MES=F", bars).unwrap();
    let breadth = FixedBreadth::with_overrides(8, 0.0, &[(5, 1000.0)]);

    let result = run_default(&series, &breadth, &EngineConfig::default());
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Short);
    assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
    assert!((trade.exit_price - 97.515).abs() < EPS);
    assert!(trade.gross_pnl > 0.0);
}

#[test]
fn no_entry_on_final_bar() {
    let series = long_setup(Vec::new());
    let result = run_default(&series, &long_breadth(6), &EngineConfig::default());
    assert!(result.trades.is_empty());
    assert_eq!(result.final_equity(), 10_000.0);
}

// ──────────────────────────────────────────────
// Equity curve shape
// ──────────────────────────────────────────────

fn wavy_series(n: usize) -> BarSeries {
    let bars = (0..n)
        .map(|i| {
            let x = i as f64;
            let open = 20_000.0 + (x * 0.37).sin() * 150.0;
            let close = 20_000.0 + ((x + 0.8) * 0.37).sin() * 150.0 + (x * 1.3).cos() * 20.0;
            let high = open.max(close) + 15.0 + (x * 0.7).sin().abs() * 30.0;
            let low = open.min(close) - 15.0 - (x * 0.9).cos().abs() * 30.0;
            let volume = 1_000 + ((i * 7919) % 4_000) as u64;
            Bar::new(t(i), open, high, low, close, volume)
        })
        .collect();
    BarSeries::new("MNQ=F", bars).unwrap()
}

#[test]
fn equity_curve_has_one_point_per_bar_and_is_flat_during_warmup() {
    let series = wavy_series(400);
    let result = completed(
        run(
            &series,
            &BarPattern::default(),
            &SeededBreadth::new(11),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap(),
    );

    assert_eq!(result.equity_curve.len(), series.len());
    assert_eq!(result.warmup_bars, 19);
    for (i, p) in result.equity_curve.iter().enumerate() {
        assert_eq!(p.bar_index, i);
        assert_eq!(p.timestamp, series.bars()[i].timestamp);
    }
    assert!(result.equity_curve[..19].iter().all(|p| p.equity == 10_000.0));
    assert!(!result.trades.is_empty(), "seeded breadth should trigger entries");

    // Trades never overlap: one position at a time.
    for pair in result.trades.windows(2) {
        assert!(pair[1].entry_bar >= pair[0].exit_bar);
    }
    // Final equity equals initial capital plus realized P&L.
    let realized: f64 = result.trades.iter().map(|t| t.net_pnl).sum();
    assert!((result.final_equity() - (10_000.0 + realized)).abs() < 1e-6);
}

#[test]
fn crossover_variant_runs_through_same_loop() {
    let series = wavy_series(400);
    let policy = create_signal(&StrategyVariant::SmaCrossover {
        sma_window: 20,
        volume_window: 20,
    })
    .unwrap();
    let result = completed(
        run(
            &series,
            policy.as_ref(),
            &SeededBreadth::new(11),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap(),
    );
    assert_eq!(result.warmup_bars, 20);
    assert_eq!(result.strategy, "sma_crossover_20_20");
    assert!(result.equity_curve[..20].iter().all(|p| p.equity == 10_000.0));
    for trade in &result.trades {
        assert!(trade.entry_bar >= 20);
    }
}

// ──────────────────────────────────────────────
// Determinism
// ──────────────────────────────────────────────

#[test]
fn identical_inputs_give_byte_identical_outputs() {
    let series = wavy_series(600);
    let breadth = FixedBreadth::new((0..600).map(|i| ((i * 613) % 3000) as f64 - 1500.0).collect());
    let risk = RiskConfig::new(0.5, 0.4, 0.0002, 1000.0, -1000.0).unwrap();
    let config = EngineConfig::new(50_000.0, 2.0);

    let a = completed(run(&series, &BarPattern::default(), &breadth, &risk, &config).unwrap());
    let b = completed(run(&series, &BarPattern::default(), &breadth, &risk, &config).unwrap());

    assert_eq!(
        serde_json::to_vec(&a.equity_curve).unwrap(),
        serde_json::to_vec(&b.equity_curve).unwrap()
    );
    assert_eq!(
        serde_json::to_vec(&a.trades).unwrap(),
        serde_json::to_vec(&b.trades).unwrap()
    );
}
