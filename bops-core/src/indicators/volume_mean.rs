//! Rolling mean of volume, the participation filter used by entry signals.
//!
//! The window is inclusive of the current bar. Lookback: period - 1.

use super::rolling::rolling_mean_series;
use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeMean {
    period: usize,
    name: String,
}

impl VolumeMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume mean period must be >= 1");
        Self {
            period,
            name: format!("volume_mean_{period}"),
        }
    }
}

impl Indicator for VolumeMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean_series(bars.iter().map(|b| b.volume as f64), self.period)
    }
}
