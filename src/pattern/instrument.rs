//! # Timed pattern evaluation.
//!
//! [`MatchTimer`] wraps every matcher call with a monotonic clock reading, warns
//! about evaluations slower than the configured threshold, and reports a
//! [`MatchSample`] to the metrics sink. The sink is called under
//! `catch_unwind`: whatever it does, the match result is returned unchanged.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics::{DispatchSample, MatchSample, MetricsSink};

use super::matcher::Pattern;

/// Pattern evaluator with cost instrumentation.
pub(crate) struct MatchTimer {
    threshold: Duration,
    sink: Arc<dyn MetricsSink>,
}

impl MatchTimer {
    pub(crate) fn new(threshold: Duration, sink: Arc<dyn MetricsSink>) -> Self {
        Self { threshold, sink }
    }

    /// Evaluates `pattern` against `event_type`, timing only the matcher itself.
    pub(crate) fn evaluate(&self, pattern: &Pattern, event_type: &str) -> bool {
        let started = Instant::now();
        let matched = pattern.matches(event_type);
        let elapsed = started.elapsed();

        let slow = self.is_slow(elapsed);
        if slow {
            tracing::warn!(
                pattern = pattern.as_str(),
                event_type,
                elapsed_us = elapsed.as_micros() as u64,
                threshold_us = self.threshold.as_micros() as u64,
                "slow pattern match"
            );
        }

        let sample = MatchSample {
            pattern: pattern.as_str(),
            event_type,
            elapsed,
            matched,
            slow,
        };
        self.report(|sink| sink.record_match(&sample));
        matched
    }

    /// Reports the per-event summary.
    pub(crate) fn dispatched(&self, sample: &DispatchSample<'_>) {
        self.report(|sink| sink.record_dispatch(sample));
    }

    #[inline]
    fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.threshold
    }

    fn report(&self, f: impl FnOnce(&dyn MetricsSink)) {
        let sink = &*self.sink;
        if panic::catch_unwind(AssertUnwindSafe(|| f(sink))).is_err() {
            tracing::debug!(sink = sink.name(), "metrics sink panicked; sample dropped");
        }
    }
}
