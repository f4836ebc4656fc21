//! # Metrics sink contract
//!
//! `MetricsSink` is the outbound hook for match-cost instrumentation. The broker
//! loop calls it synchronously, so implementations must be cheap (bump counters,
//! push into a lock-free queue, emit a trace event).
//!
//! ## Contract
//! - [`MetricsSink::record_match`] runs once per pattern evaluation.
//! - [`MetricsSink::record_dispatch`] runs once per emitted event, after delivery.
//! - A panicking sink is caught by the caller; the sample is dropped and delivery
//!   continues unchanged.

use std::time::Duration;

/// One timed pattern evaluation.
#[derive(Debug, Clone, Copy)]
pub struct MatchSample<'a> {
    /// Raw pattern string as subscribed.
    pub pattern: &'a str,
    /// Event type it was evaluated against.
    pub event_type: &'a str,
    /// Time spent inside the matcher.
    pub elapsed: Duration,
    /// Matcher result.
    pub matched: bool,
    /// `elapsed` exceeded the configured slow-match threshold.
    pub slow: bool,
}

/// Summary of one emit.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSample<'a> {
    /// Type of the emitted event.
    pub event_type: &'a str,
    /// Deliveries made through the exact-type index.
    pub exact_deliveries: usize,
    /// Deliveries made through the pattern index.
    pub pattern_deliveries: usize,
    /// Number of patterns evaluated.
    pub patterns_evaluated: usize,
    /// Wall time of history insert, delivery and pattern scan.
    pub elapsed: Duration,
}

/// Receiver of instrumentation samples.
pub trait MetricsSink: Send + Sync + 'static {
    /// Records a single pattern evaluation.
    fn record_match(&self, sample: &MatchSample<'_>);

    /// Records the outcome of one emit. Default: ignored.
    fn record_dispatch(&self, _sample: &DispatchSample<'_>) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Default sink: forwards every sample as a `trace` event on the
/// `evbroker::metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_match(&self, s: &MatchSample<'_>) {
        tracing::trace!(
            target: "evbroker::metrics",
            pattern = s.pattern,
            event_type = s.event_type,
            elapsed_us = s.elapsed.as_micros() as u64,
            matched = s.matched,
            slow = s.slow,
            "pattern evaluated"
        );
    }

    fn record_dispatch(&self, s: &DispatchSample<'_>) {
        tracing::trace!(
            target: "evbroker::metrics",
            event_type = s.event_type,
            exact = s.exact_deliveries,
            pattern = s.pattern_deliveries,
            evaluated = s.patterns_evaluated,
            elapsed_us = s.elapsed.as_micros() as u64,
            "event dispatched"
        );
    }

    fn name(&self) -> &'static str {
        "TracingMetrics"
    }
}
