//! BOPS Core — bar series, indicators, signal policies, bracket positions, simulation loop.
//!
//! This crate contains the simulation core:
//! - Domain types (bars, series, positions, trades, equity points, timeframes)
//! - Indicator cache with SMA, rolling volume mean and Wilder ATR
//! - Injected breadth providers and the `SignalPolicy` entry rules
//! - Single-position manager with take-profit / stop-loss brackets
//! - Sequential bar loop returning an equity curve and trade log
//!
//! No I/O happens here: data arrives fully materialized as a `BarSeries`.

pub mod components;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod rng;

pub use components::{
    create_signal, BreadthProvider, BreadthSource, ConstantBreadth, FixedBreadth, GapPolicy,
    IndicatorCache, IndicatorKey, PathPolicy, SeededBreadth, Signal, SignalPolicy,
    StrategyVariant,
};
pub use domain::{
    Bar, BarError, BarSeries, EquityPoint, ExitReason, Position, PositionSide, SeriesError, Side,
    Timeframe, Trade,
};
pub use engine::{run, ConfigError, EngineConfig, EngineError, RiskConfig, RunOutcome, RunResult, SkipReason};
