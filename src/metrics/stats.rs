//! # MatchStats: in-memory aggregate sink
//!
//! Lock-free counters over every sample the broker reports. Useful for tests,
//! health endpoints, or as a cheap always-on sink next to a real exporter.
//!
//! ```rust
//! use std::sync::Arc;
//! use evbroker::metrics::MatchStats;
//!
//! let stats = Arc::new(MatchStats::new());
//! // Broker::builder(cfg).with_metrics(stats.clone()).build();
//! assert_eq!(stats.snapshot().evaluations, 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use super::sink::{DispatchSample, MatchSample, MetricsSink};

/// Point-in-time copy of [`MatchStats`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Pattern evaluations observed.
    pub evaluations: u64,
    /// Evaluations that matched.
    pub matches: u64,
    /// Evaluations above the slow-match threshold.
    pub slow: u64,
    /// Total time spent in the matcher (ns).
    pub match_nanos: u64,
    /// Events dispatched.
    pub dispatched: u64,
    /// Deliveries across both indexes.
    pub deliveries: u64,
}

/// Aggregating metrics sink.
#[derive(Debug, Default)]
pub struct MatchStats {
    evaluations: AtomicU64,
    matches: AtomicU64,
    slow: AtomicU64,
    match_nanos: AtomicU64,
    dispatched: AtomicU64,
    deliveries: AtomicU64,
}

impl MatchStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            evaluations: self.evaluations.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            slow: self.slow.load(Ordering::Relaxed),
            match_nanos: self.match_nanos.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for MatchStats {
    fn record_match(&self, s: &MatchSample<'_>) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        if s.matched {
            self.matches.fetch_add(1, Ordering::Relaxed);
        }
        if s.slow {
            self.slow.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = s.elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.match_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn record_dispatch(&self, s: &DispatchSample<'_>) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let delivered = (s.exact_deliveries + s.pattern_deliveries) as u64;
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "MatchStats"
    }
}
