//! Bar-by-bar simulation loop.
//!
//! Per bar, in order:
//! 1. Exits: resolve the open position's bracket against this bar
//! 2. Signal: evaluate the policy (only once warm-up is satisfied)
//! 3. Reversal: an opposite signal closes the open position at the close
//! 4. Entry: open on a signal when flat (never on the final bar)
//! 5. End of data: force-close on the final bar
//! 6. Equity: append cash + mark-to-market at the close

use crate::components::breadth::BreadthProvider;
use crate::components::indicator::IndicatorCache;
use crate::components::signal::{SignalEvaluator, SignalPolicy};
use crate::domain::{BarSeries, EquityPoint, ExitReason};

use super::config::{EngineConfig, RiskConfig};
use super::error::EngineError;
use super::position_manager::PositionManager;
use super::state::{RunOutcome, RunResult, SkipReason};

use tracing::{debug, info};

/// Run one simulation.
///
/// Strictly sequential over `series`; the result is a pure function of the
/// inputs, so identical inputs yield identical equity curves and trade logs.
/// Independent runs share nothing and may execute in parallel.
pub fn run(
    series: &BarSeries,
    policy: &dyn SignalPolicy,
    breadth: &dyn BreadthProvider,
    risk: &RiskConfig,
    config: &EngineConfig,
) -> Result<RunOutcome, EngineError> {
    config.validate()?;

    if series.is_empty() {
        info!(symbol = series.symbol(), "run skipped: empty series");
        return Ok(RunOutcome::Skipped(SkipReason::EmptySeries));
    }

    let keys = policy.required_indicators();
    let indicators = IndicatorCache::build(series, &keys);
    // First bar the policy is evaluated on.
    let warmup = policy.warmup_bars().max(indicators.warmup());
    // Runnable once the series covers the largest indicator window; a series
    // shorter than `warmup + 1` then completes with no signals evaluated.
    let required = keys.iter().map(|k| k.window()).max().unwrap_or(0).max(1);
    if series.len() < required {
        info!(
            symbol = series.symbol(),
            bars = series.len(),
            required,
            "run skipped: insufficient warm-up"
        );
        return Ok(RunOutcome::Skipped(SkipReason::InsufficientWarmup {
            bars: series.len(),
            required,
        }));
    }

    let evaluator = SignalEvaluator::new(policy, breadth);
    let mut manager = PositionManager::new(config, risk);
    let mut equity_curve = Vec::with_capacity(series.len());
    let last = series.len() - 1;

    for (i, bar) in series.bars().iter().enumerate() {
        // ─── Exits ───
        manager.resolve_exits(i, bar);

        // ─── Signal, reversal, entry ───
        if i >= warmup {
            let evaluation = evaluator
                .evaluate(i, series, &indicators, risk, manager.side())
                .map_err(contract_violation)?;
            if let Some(side) = evaluation.signal.side() {
                if !manager.is_flat() {
                    manager.close(i, bar, bar.close, ExitReason::SignalReversal);
                }
                if i < last {
                    manager.open(side, i, bar, evaluation.breadth);
                }
            }
        }

        // ─── End of data ───
        if i == last {
            manager.close(i, bar, bar.close, ExitReason::EndOfData);
        }

        equity_curve.push(EquityPoint {
            bar_index: i,
            timestamp: bar.timestamp,
            equity: manager.equity(bar.close),
        });
    }

    let trades = manager.into_trades();
    info!(
        symbol = series.symbol(),
        strategy = policy.name(),
        bars = series.len(),
        trades = trades.len(),
        final_equity = equity_curve.last().map(|p| p.equity),
        "run complete"
    );

    Ok(RunOutcome::Completed(RunResult {
        symbol: series.symbol().to_string(),
        strategy: policy.name().to_string(),
        breadth_source: breadth.name().to_string(),
        initial_capital: config.initial_capital,
        warmup_bars: warmup,
        equity_curve,
        trades,
    }))
}

/// Index/warm-up errors after the warm-up gate mean a policy misreported its
/// requirements. Loud in debug builds, propagated in release.
fn contract_violation(err: EngineError) -> EngineError {
    if let EngineError::Series(inner) = &err {
        debug!(error = %inner, "signal policy contract violation");
        if cfg!(debug_assertions) {
            panic!("signal policy contract violation: {inner}");
        }
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::breadth::{ConstantBreadth, FixedBreadth};
    use crate::components::signal::BarPattern;
    use crate::domain::{Bar, Side};
    use chrono::{Duration, TimeZone, Utc};

    fn flat_bars(n: usize) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        (0..n)
            .map(|i| Bar::new(base + Duration::hours(i as i64), 100.0, 100.0, 100.0, 100.0, 1000))
            .collect()
    }

    #[test]
    fn empty_series_is_skipped() {
        let series = BarSeries::empty("X");
        let out = run(
            &series,
            &BarPattern::default(),
            &ConstantBreadth(0.0),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out, RunOutcome::Skipped(SkipReason::EmptySeries));
    }

    #[test]
    fn short_series_is_skipped() {
        let series = BarSeries::new("X", flat_bars(10)).unwrap();
        let out = run(
            &series,
            &BarPattern::default(),
            &ConstantBreadth(0.0),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(
            out.skip_reason(),
            Some(SkipReason::InsufficientWarmup {
                bars: 10,
                required: 20
            })
        );
    }

    #[test]
    fn invalid_engine_config_is_an_error() {
        let series = BarSeries::new("X", flat_bars(3)).unwrap();
        let err = run(
            &series,
            &BarPattern::new(1),
            &ConstantBreadth(0.0),
            &RiskConfig::default(),
            &EngineConfig::new(-5.0, 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_breadth_after_warmup_is_an_error() {
        let series = BarSeries::new("X", flat_bars(5)).unwrap();
        let err = run(
            &series,
            &BarPattern::new(2),
            &FixedBreadth::new(vec![0.0; 3]),
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingBreadth {
                provider: "fixed".into(),
                bar_index: 3
            }
        );
    }

    #[test]
    fn reversal_flips_position_on_same_bar() {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        let t = |i: i64| base + Duration::hours(i);
        let bars = vec![
            Bar::new(t(0), 100.0, 100.2, 99.8, 100.0, 1000),
            Bar::new(t(1), 100.0, 100.6, 99.9, 100.5, 3000), // bullish, heavy
            Bar::new(t(2), 100.5, 100.6, 100.0, 100.1, 4000), // bearish, heavy
            Bar::new(t(3), 100.1, 100.3, 99.9, 100.2, 1000),
        ];
        let series = BarSeries::new("X", bars).unwrap();
        let breadth = FixedBreadth::new(vec![0.0, -1200.0, 1200.0, 0.0]);
        let result = run(
            &series,
            &BarPattern::new(2),
            &breadth,
            &RiskConfig::default(),
            &EngineConfig::default(),
        )
        .unwrap()
        .into_completed()
        .unwrap();

        assert_eq!(result.trades.len(), 2);
        let first = &result.trades[0];
        assert_eq!(first.side, Side::Long);
        assert_eq!(first.exit_reason, ExitReason::SignalReversal);
        assert_eq!((first.entry_bar, first.exit_bar), (1, 2));
        assert_eq!(first.exit_price, 100.1);
        let second = &result.trades[1];
        assert_eq!(second.side, Side::Short);
        assert_eq!(second.exit_reason, ExitReason::EndOfData);
        assert_eq!((second.entry_bar, second.exit_bar), (2, 3));
        assert_eq!(second.exit_price, 100.2);
        assert_eq!(result.equity_curve.len(), 4);
    }
}
