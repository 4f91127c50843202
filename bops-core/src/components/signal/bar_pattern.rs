//! Bar-pattern entry — breadth extreme confirmed by bar color and volume.
//!
//! Long when breadth is at or below the low threshold on a bullish bar
//! (close > open) with volume above its rolling mean. Short mirrors it with the
//! high threshold and a bearish bar.

use super::{gated_signal, Signal, SignalContext, SignalPolicy};
use crate::components::indicator::IndicatorKey;
use crate::domain::SeriesError;

pub const DEFAULT_VOLUME_WINDOW: usize = 20;

#[derive(Debug, Clone)]
pub struct BarPattern {
    volume_window: usize,
    name: String,
}

impl BarPattern {
    pub fn new(volume_window: usize) -> Self {
        assert!(volume_window >= 1, "volume_window must be >= 1");
        Self {
            volume_window,
            name: format!("bar_pattern_{volume_window}"),
        }
    }

    pub fn volume_window(&self) -> usize {
        self.volume_window
    }

    fn volume_key(&self) -> IndicatorKey {
        IndicatorKey::VolumeMean(self.volume_window)
    }
}

impl Default for BarPattern {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_WINDOW)
    }
}

impl SignalPolicy for BarPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        vec![self.volume_key()]
    }

    fn warmup_bars(&self) -> usize {
        self.volume_key().lookback()
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Signal, SeriesError> {
        let bar = ctx.series.at(ctx.bar_index)?;
        let volume_mean = ctx.indicators.require(self.volume_key(), ctx.bar_index)?;
        let heavy = bar.volume as f64 > volume_mean;
        Ok(gated_signal(
            ctx,
            heavy && bar.is_bullish(),
            heavy && bar.is_bearish(),
        ))
    }
}
