//! In-memory fetch cache with a time-to-live.
//!
//! Wraps any provider and memoizes successful fetches per `DataRequest`.
//! An entry older than the TTL is refetched on next access. Failures are
//! never cached. The clock is injectable so expiry is testable.

use std::collections::HashMap;
use std::sync::Mutex;

use bops_core::domain::Bar;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::{DataError, DataRequest, MarketDataProvider};

pub const DEFAULT_TTL_SECS: i64 = 3_600;

pub fn default_ttl() -> Duration {
    Duration::seconds(DEFAULT_TTL_SECS)
}

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry {
    fetched_at: DateTime<Utc>,
    bars: Vec<Bar>,
}

pub struct CachedProvider<P, C = SystemClock> {
    inner: P,
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<DataRequest, CacheEntry>>,
    name: String,
}

impl<P: MarketDataProvider> CachedProvider<P, SystemClock> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, SystemClock)
    }
}

impl<P: MarketDataProvider, C: Clock> CachedProvider<P, C> {
    pub fn with_clock(inner: P, ttl: Duration, clock: C) -> Self {
        let name = format!("cached_{}", inner.name());
        Self {
            inner,
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            name,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of cached requests, including expired ones not yet refetched.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DataRequest, CacheEntry>> {
        // A panic while holding the lock leaves the map itself intact.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<P: MarketDataProvider, C: Clock> MarketDataProvider for CachedProvider<P, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, request: &DataRequest) -> Result<Vec<Bar>, DataError> {
        let now = self.clock.now();
        if let Some(entry) = self.lock().get(request) {
            if now - entry.fetched_at < self.ttl {
                debug!(symbol = %request.symbol, "data cache hit");
                return Ok(entry.bars.clone());
            }
            warn!(symbol = %request.symbol, "cached data expired, refetching");
        }

        // The lock is not held across the fetch; concurrent misses may fetch twice.
        let bars = self.inner.fetch(request)?;
        self.lock().insert(
            request.clone(),
            CacheEntry {
                fetched_at: now,
                bars: bars.clone(),
            },
        );
        Ok(bars)
    }
}
