//! # Broker configuration.
//!
//! Provides [`BrokerConfig`], fixed at construction time via
//! [`Broker::builder`](crate::Broker::builder) or [`Broker::new`](crate::Broker::new).
//!
//! ## Sentinel values
//! - `max_history = 0` → history disabled (every event is evicted immediately)
//! - `slow_match_threshold = 0s` → every measurable evaluation is reported as slow

use std::time::Duration;

/// Configuration of a broker instance.
///
/// ## Field semantics
/// - `max_history`: events retained for [`get_history`](crate::Broker::get_history)
/// - `slow_match_threshold`: pattern evaluations slower than this are logged at `warn`
/// - `transport_capacity`: forwarding queue size towards the transport (min 1)
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Maximum number of events kept in the history buffer.
    ///
    /// Oldest events are evicted first. Cannot be changed after construction.
    pub max_history: usize,

    /// Threshold above which a single pattern evaluation counts as slow.
    pub slow_match_threshold: Duration,

    /// Capacity of the queue feeding the outbound transport worker.
    ///
    /// When full, copies are dropped (best-effort delivery). Minimum 1.
    pub transport_capacity: usize,
}

impl BrokerConfig {
    /// Returns `true` if the broker keeps any history at all.
    #[inline]
    pub fn history_enabled(&self) -> bool {
        self.max_history > 0
    }

    /// Returns the transport queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn transport_capacity_clamped(&self) -> usize {
        self.transport_capacity.max(1)
    }
}

impl Default for BrokerConfig {
    /// Default configuration:
    ///
    /// - `max_history = 1000`
    /// - `slow_match_threshold = 1000µs`
    /// - `transport_capacity = 1024`
    fn default() -> Self {
        Self {
            max_history: 1000,
            slow_match_threshold: Duration::from_micros(1000),
            transport_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BrokerConfig::default();
        assert_eq!(cfg.max_history, 1000);
        assert_eq!(cfg.slow_match_threshold, Duration::from_micros(1000));
        assert!(cfg.history_enabled());
    }

    #[test]
    fn test_sentinels() {
        let cfg = BrokerConfig {
            max_history: 0,
            transport_capacity: 0,
            ..BrokerConfig::default()
        };
        assert!(!cfg.history_enabled());
        assert_eq!(cfg.transport_capacity_clamped(), 1);
    }
}
