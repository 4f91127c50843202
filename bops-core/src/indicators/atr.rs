//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with the mean
//! of the first `period` true ranges that have a previous close.
//! Lookback: period (bar 0 has no previous close).

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Streaming Wilder ATR: one O(1) update per bar.
#[derive(Debug, Clone)]
pub struct WilderAtr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl WilderAtr {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    pub fn push(&mut self, bar: &Bar) -> Option<f64> {
        if let Some(pc) = self.prev_close {
            let tr = true_range(bar, pc);
            self.value = match self.value {
                Some(prev) => {
                    let alpha = 1.0 / self.period as f64;
                    Some(alpha * tr + (1.0 - alpha) * prev)
                }
                None => {
                    self.seed_sum += tr;
                    self.seed_count += 1;
                    (self.seed_count == self.period).then(|| self.seed_sum / self.period as f64)
                }
            };
        }
        self.prev_close = Some(bar.close);
        self.value
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut atr = WilderAtr::new(self.period);
        bars.iter()
            .map(|b| atr.push(b).unwrap_or(f64::NAN))
            .collect()
    }
}
