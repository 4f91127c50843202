//! Breadth providers — one market-sentiment reading per bar index.
//!
//! The engine never generates breadth itself. A provider is injected at run
//! construction, so tests can pin readings exactly and replays are
//! reproducible.

use crate::rng::RngHierarchy;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Supplies the breadth (tick-sentiment) reading for a bar.
///
/// `reading` must be a pure function of `bar_index`: asking twice for the same
/// bar returns the same value. `None` means the feed has no reading for that
/// bar, which the engine reports as an error rather than guessing.
pub trait BreadthProvider: Send + Sync {
    fn name(&self) -> &str;

    fn reading(&self, bar_index: usize) -> Option<f64>;
}

/// Explicit readings, one per bar.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedBreadth {
    readings: Vec<f64>,
}

impl FixedBreadth {
    pub fn new(readings: Vec<f64>) -> Self {
        Self { readings }
    }

    /// `len` readings of `neutral`, with `overrides` applied at their indices.
    pub fn with_overrides(len: usize, neutral: f64, overrides: &[(usize, f64)]) -> Self {
        let mut readings = vec![neutral; len];
        for &(i, v) in overrides {
            if let Some(slot) = readings.get_mut(i) {
                *slot = v;
            }
        }
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl BreadthProvider for FixedBreadth {
    fn name(&self) -> &str {
        "fixed"
    }

    fn reading(&self, bar_index: usize) -> Option<f64> {
        self.readings.get(bar_index).copied()
    }
}

/// The same reading on every bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantBreadth(pub f64);

impl BreadthProvider for ConstantBreadth {
    fn name(&self) -> &str {
        "constant"
    }

    fn reading(&self, _bar_index: usize) -> Option<f64> {
        Some(self.0)
    }
}

/// Synthetic tick-breadth: a uniform integer in `[min, max)` per bar.
///
/// Each bar's value comes from its own BLAKE3-derived sub-seed, so readings are
/// random-access and identical across runs with the same seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeededBreadth {
    hierarchy: RngHierarchy,
    min: i64,
    max: i64,
}

pub const SYNTHETIC_BREADTH_MIN: i64 = -1500;
pub const SYNTHETIC_BREADTH_MAX: i64 = 1500;

impl SeededBreadth {
    pub fn new(seed: u64) -> Self {
        Self::with_range(seed, SYNTHETIC_BREADTH_MIN, SYNTHETIC_BREADTH_MAX)
    }

    /// An empty range (`max <= min`) collapses to the constant `min`.
    pub fn with_range(seed: u64, min: i64, max: i64) -> Self {
        Self {
            hierarchy: RngHierarchy::new(seed),
            min,
            max,
        }
    }

    pub fn seed(&self) -> u64 {
        self.hierarchy.master_seed()
    }
}

impl BreadthProvider for SeededBreadth {
    fn name(&self) -> &str {
        "seeded"
    }

    fn reading(&self, bar_index: usize) -> Option<f64> {
        if self.max <= self.min {
            return Some(self.min as f64);
        }
        let mut rng = self.hierarchy.rng_for("breadth", bar_index as u64);
        Some(rng.gen_range(self.min..self.max) as f64)
    }
}

/// Serializable breadth source selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BreadthSource {
    Seeded {
        seed: u64,
        #[serde(default = "default_min")]
        min: i64,
        #[serde(default = "default_max")]
        max: i64,
    },
    Constant {
        value: f64,
    },
    Fixed {
        readings: Vec<f64>,
    },
}

fn default_min() -> i64 {
    SYNTHETIC_BREADTH_MIN
}

fn default_max() -> i64 {
    SYNTHETIC_BREADTH_MAX
}

impl Default for BreadthSource {
    fn default() -> Self {
        BreadthSource::Seeded {
            seed: 42,
            min: SYNTHETIC_BREADTH_MIN,
            max: SYNTHETIC_BREADTH_MAX,
        }
    }
}

impl BreadthSource {
    pub fn build(&self) -> Box<dyn BreadthProvider> {
        match self {
            BreadthSource::Seeded { seed, min, max } => {
                Box::new(SeededBreadth::with_range(*seed, *min, *max))
            }
            BreadthSource::Constant { value } => Box::new(ConstantBreadth(*value)),
            BreadthSource::Fixed { readings } => Box::new(FixedBreadth::new(readings.clone())),
        }
    }
}
