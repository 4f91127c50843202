//! Fixed-window rolling mean with O(1) updates.

use std::collections::VecDeque;

/// Rolling arithmetic mean over the trailing `window` values.
///
/// Each `push` adds the entering value and drops the leaving one from a running
/// sum, so a full series costs O(n) regardless of the window length.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
        }
    }

    /// Feed the next value; returns the mean once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(leaving) = self.values.pop_front() {
                self.sum -= leaving;
            }
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        (self.values.len() == self.window).then(|| self.sum / self.window as f64)
    }
}

/// Run a rolling mean across `values`, NaN until the window fills.
pub fn rolling_mean_series(values: impl IntoIterator<Item = f64>, window: usize) -> Vec<f64> {
    let mut rolling = RollingMean::new(window);
    values
        .into_iter()
        .map(|v| rolling.push(v).unwrap_or(f64::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn fills_then_rolls() {
        let mut r = RollingMean::new(3);
        assert_eq!(r.push(1.0), None);
        assert_eq!(r.push(2.0), None);
        assert_approx(r.push(3.0).unwrap(), 2.0, DEFAULT_EPSILON);
        assert_approx(r.push(10.0).unwrap(), 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn series_matches_naive_mean() {
        let values: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 + 0.5).collect();
        let fast = rolling_mean_series(values.iter().copied(), 7);
        for i in 6..values.len() {
            let naive = values[i - 6..=i].iter().sum::<f64>() / 7.0;
            assert_approx(fast[i], naive, 1e-9);
        }
        assert!(fast[..6].iter().all(|v| v.is_nan()));
    }
}
