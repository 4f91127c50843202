//! SMA crossover entry — breadth extreme confirmed by price crossing its SMA.
//!
//! Same breadth and volume gate as the bar-pattern rule, but the bar-color test
//! is replaced by a cross of close over the SMA of close:
//! long when `close[i-1] <= sma[i-1]` and `close[i] > sma[i]`, short on the
//! mirror cross.

use super::{gated_signal, Signal, SignalContext, SignalPolicy};
use crate::components::indicator::IndicatorKey;
use crate::domain::SeriesError;

pub const DEFAULT_SMA_WINDOW: usize = 20;

#[derive(Debug, Clone)]
pub struct SmaCrossover {
    sma_window: usize,
    volume_window: usize,
    name: String,
}

impl SmaCrossover {
    pub fn new(sma_window: usize, volume_window: usize) -> Self {
        assert!(sma_window >= 1, "sma_window must be >= 1");
        assert!(volume_window >= 1, "volume_window must be >= 1");
        Self {
            sma_window,
            volume_window,
            name: format!("sma_crossover_{sma_window}_{volume_window}"),
        }
    }

    fn sma_key(&self) -> IndicatorKey {
        IndicatorKey::Sma(self.sma_window)
    }

    fn volume_key(&self) -> IndicatorKey {
        IndicatorKey::VolumeMean(self.volume_window)
    }
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self::new(DEFAULT_SMA_WINDOW, super::bar_pattern::DEFAULT_VOLUME_WINDOW)
    }
}

impl SignalPolicy for SmaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        vec![self.sma_key(), self.volume_key()]
    }

    /// The cross compares against the previous bar's SMA, so one bar more than
    /// the SMA lookback.
    fn warmup_bars(&self) -> usize {
        (self.sma_key().lookback() + 1).max(self.volume_key().lookback())
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Signal, SeriesError> {
        let i = ctx.bar_index;
        if i == 0 {
            return Err(SeriesError::IndicatorNotReady {
                name: self.sma_key().to_string(),
                index: 0,
            });
        }
        let bar = ctx.series.at(i)?;
        let prev = ctx.series.at(i - 1)?;
        let sma = ctx.indicators.require(self.sma_key(), i)?;
        let sma_prev = ctx.indicators.require(self.sma_key(), i - 1)?;
        let volume_mean = ctx.indicators.require(self.volume_key(), i)?;

        let heavy = bar.volume as f64 > volume_mean;
        let crossed_up = prev.close <= sma_prev && bar.close > sma;
        let crossed_down = prev.close >= sma_prev && bar.close < sma;
        Ok(gated_signal(ctx, heavy && crossed_up, heavy && crossed_down))
    }
}
