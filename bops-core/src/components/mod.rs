//! Component traits and implementations plugged into the simulation loop.
//!
//! - Indicator: precomputed numeric series, memoized per run in `IndicatorCache`
//! - Breadth provider: one sentiment reading per bar, injected
//! - Signal policy: entry rule selected by `StrategyVariant`
//! - Execution policies: intrabar path and gap handling for brackets

pub mod breadth;
pub mod execution;
pub mod factory;
pub mod indicator;
pub mod signal;

pub use breadth::{BreadthProvider, BreadthSource, ConstantBreadth, FixedBreadth, SeededBreadth};
pub use execution::{BarPath, GapPolicy, PathPolicy};
pub use factory::{create_signal, StrategyVariant};
pub use indicator::{Indicator, IndicatorCache, IndicatorKey};
pub use signal::{
    BarPattern, Evaluation, Signal, SignalContext, SignalEvaluator, SignalPolicy, SmaCrossover,
};
