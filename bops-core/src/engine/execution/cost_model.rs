//! Cost model — round-trip commission charged when a position closes.
//!
//! `commission = rate * (entry_price * size + exit_price * size)`

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Fraction of notional per side (0.0002 = 2 bps).
    pub commission_rate: f64,
}

impl CostModel {
    pub fn new(commission_rate: f64) -> Self {
        Self { commission_rate }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0)
    }

    /// Commission on one fill.
    pub fn side_commission(&self, price: f64, size: f64) -> f64 {
        price * size * self.commission_rate
    }

    /// Commission on entry and exit notional together.
    pub fn round_trip_commission(&self, entry_price: f64, exit_price: f64, size: f64) -> f64 {
        self.side_commission(entry_price, size) + self.side_commission(exit_price, size)
    }
}
