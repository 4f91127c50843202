//! Signal evaluation — directional entry intent per bar.
//!
//! A `SignalPolicy` is a pure function of the bar index, the series and its
//! indicator cache, the bar's breadth reading, the risk thresholds and the
//! current position side. Policies never touch positions or equity; the engine
//! acts on what they return.

pub mod bar_pattern;
pub mod sma_crossover;

pub use bar_pattern::BarPattern;
pub use sma_crossover::SmaCrossover;

use super::breadth::BreadthProvider;
use super::indicator::{IndicatorCache, IndicatorKey};
use crate::domain::{BarSeries, PositionSide, SeriesError, Side};
use crate::engine::{EngineError, RiskConfig};
use serde::{Deserialize, Serialize};

/// Directional outcome of a policy for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    None,
}

impl Signal {
    pub fn side(self) -> Option<Side> {
        match self {
            Signal::Long => Some(Side::Long),
            Signal::Short => Some(Side::Short),
            Signal::None => None,
        }
    }
}

/// Everything a policy may look at for bar `bar_index`.
#[derive(Clone, Copy)]
pub struct SignalContext<'a> {
    pub bar_index: usize,
    pub series: &'a BarSeries,
    pub indicators: &'a IndicatorCache,
    pub breadth: f64,
    pub risk: &'a RiskConfig,
    pub position: PositionSide,
}

/// Strategy entry rule.
///
/// # Look-ahead guard
/// `evaluate` must only read bars and indicator values at indices
/// `<= ctx.bar_index`.
pub trait SignalPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Indicator series the cache must hold before the loop starts.
    fn required_indicators(&self) -> Vec<IndicatorKey>;

    /// First bar index at which `evaluate` may be called.
    fn warmup_bars(&self) -> usize;

    fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Signal, SeriesError>;
}

/// Shared breadth/position gate used by every policy.
///
/// Long needs breadth at or below the low threshold and no long already open;
/// short needs breadth at or above the high threshold and no short open.
/// Long is checked first.
pub(crate) fn gated_signal(ctx: &SignalContext<'_>, long_setup: bool, short_setup: bool) -> Signal {
    if long_setup && ctx.breadth <= ctx.risk.low_threshold() && !ctx.position.is_long() {
        return Signal::Long;
    }
    if short_setup && ctx.breadth >= ctx.risk.high_threshold() && !ctx.position.is_short() {
        return Signal::Short;
    }
    Signal::None
}

/// A signal together with the breadth reading it was evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub signal: Signal,
    pub breadth: f64,
}

/// Pairs a policy with its breadth feed.
pub struct SignalEvaluator<'a> {
    policy: &'a dyn SignalPolicy,
    breadth: &'a dyn BreadthProvider,
}

impl<'a> SignalEvaluator<'a> {
    pub fn new(policy: &'a dyn SignalPolicy, breadth: &'a dyn BreadthProvider) -> Self {
        Self { policy, breadth }
    }

    pub fn policy(&self) -> &dyn SignalPolicy {
        self.policy
    }

    /// Read breadth for `bar_index` and run the policy against it.
    pub fn evaluate(
        &self,
        bar_index: usize,
        series: &BarSeries,
        indicators: &IndicatorCache,
        risk: &RiskConfig,
        position: PositionSide,
    ) -> Result<Evaluation, EngineError> {
        let breadth = self
            .breadth
            .reading(bar_index)
            .ok_or_else(|| EngineError::MissingBreadth {
                provider: self.breadth.name().to_string(),
                bar_index,
            })?;
        if !breadth.is_finite() {
            return Err(EngineError::NonFiniteBreadth {
                provider: self.breadth.name().to_string(),
                bar_index,
                value: breadth,
            });
        }
        let ctx = SignalContext {
            bar_index,
            series,
            indicators,
            breadth,
            risk,
            position,
        };
        let signal = self.policy.evaluate(&ctx)?;
        Ok(Evaluation { signal, breadth })
    }
}
