//! Seeded random-walk bars for offline runs and benchmarks.
//!
//! Sessions open at 14:30 UTC on weekdays and hold `bars_per_session` bars of
//! the requested interval. The walk is a pure function of (seed, symbol,
//! request), so repeated fetches return identical bars.

use bops_core::domain::{Bar, Timeframe};
use bops_core::rng::RngHierarchy;
use chrono::{Datelike, NaiveTime, Weekday};
use rand::Rng;

use super::{DataError, DataRequest, MarketDataProvider};

const SESSION_OPEN: (u32, u32) = (14, 30);

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    rng: RngHierarchy,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngHierarchy::new(seed),
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    /// Generate bars for `request` without the `Result` wrapper.
    pub fn generate(&self, request: &DataRequest) -> Vec<Bar> {
        let mut rng = self.rng.rng_for(&format!("synthetic/{}", request.symbol), 0);
        let step = request.timeframe.duration();
        let per_session = request.timeframe.bars_per_session() as usize;
        let vol = bar_volatility(request.timeframe);
        let session_open =
            NaiveTime::from_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0).unwrap_or(NaiveTime::MIN);

        let mut bars = Vec::new();
        let mut price = self.start_price;
        let mut day = request.start;

        while day <= request.end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                let open_time = day.and_time(session_open).and_utc();
                for k in 0..per_session {
                    let ret: f64 = rng.gen_range(-vol..vol);
                    let open = price;
                    let close = price * (1.0 + ret);
                    let high = open.max(close) * (1.0 + rng.gen_range(0.0..vol / 2.0));
                    let low = open.min(close) * (1.0 - rng.gen_range(0.0..vol / 2.0));
                    let volume = rng.gen_range(500..5_000u64);
                    bars.push(Bar::new(
                        open_time + step * k as i32,
                        open,
                        high,
                        low,
                        close,
                        volume,
                    ));
                    price = close;
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        bars
    }
}

/// Per-bar return half-range, scaled with the square root of bar length.
fn bar_volatility(timeframe: Timeframe) -> f64 {
    0.002 * (timeframe.duration().num_minutes() as f64 / 15.0).sqrt()
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        Ok(self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bops_core::domain::BarSeries;
    use chrono::NaiveDate;

    fn request(timeframe: Timeframe) -> DataRequest {
        DataRequest::new(
            "MNQ=F",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), // Monday
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(), // Sunday
            timeframe,
        )
    }

    #[test]
    fn weekdays_times_bars_per_session() {
        let p = SyntheticProvider::new(7);
        assert_eq!(p.generate(&request(Timeframe::H1)).len(), 5 * 7);
        assert_eq!(p.generate(&request(Timeframe::M15)).len(), 5 * 26);
        assert_eq!(p.generate(&request(Timeframe::D1)).len(), 5);
    }

    #[test]
    fn bars_are_valid_series() {
        let p = SyntheticProvider::new(11);
        for tf in Timeframe::ALL {
            let bars = p.generate(&request(tf));
            assert!(BarSeries::new("MNQ=F", bars).is_ok(), "{tf}");
        }
    }

    #[test]
    fn same_seed_same_bars() {
        let a = SyntheticProvider::new(3).generate(&request(Timeframe::H1));
        let b = SyntheticProvider::new(3).generate(&request(Timeframe::H1));
        let c = SyntheticProvider::new(4).generate(&request(Timeframe::H1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn weekend_only_range_is_empty() {
        let req = DataRequest::new(
            "MNQ=F",
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            Timeframe::H1,
        );
        assert!(SyntheticProvider::new(1).generate(&req).is_empty());
    }
}
