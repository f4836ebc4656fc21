use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::metrics::{MetricsSink, TracingMetrics};
use crate::pattern::MatchTimer;
use crate::transport::{Forwarder, Transport};

use super::{
    broker::Broker, config::BrokerConfig, history::History, runtime::BrokerLoop, watch::Watcher,
};

/// Builder for constructing a [`Broker`] with optional collaborators.
pub struct BrokerBuilder {
    cfg: BrokerConfig,
    transport: Option<Arc<dyn Transport>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl BrokerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BrokerConfig) -> Self {
        Self {
            cfg,
            transport: None,
            metrics: None,
        }
    }

    /// Sets the outbound transport that receives a copy of every event.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the metrics sink for match-cost samples.
    ///
    /// Defaults to [`TracingMetrics`].
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Spawns the broker loop and returns its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Broker {
        let token = CancellationToken::new();
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (down_tx, down_rx) = mpsc::unbounded_channel();

        let history = History::new(self.cfg.max_history);
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(TracingMetrics) as Arc<dyn MetricsSink>);
        let forwarder = self
            .transport
            .map(|t| Forwarder::spawn(t, self.cfg.transport_capacity_clamped()));

        tracing::debug!(
            max_history = self.cfg.max_history,
            history = self.cfg.history_enabled(),
            slow_match_us = self.cfg.slow_match_threshold.as_micros() as u64,
            transport = forwarder.is_some(),
            metrics = metrics.name(),
            "starting broker"
        );

        let state = BrokerLoop::new(
            history.clone(),
            Watcher::new(token.clone(), down_tx),
            MatchTimer::new(self.cfg.slow_match_threshold, metrics),
            forwarder,
        );
        let join = tokio::spawn(state.run(req_rx, down_rx, token.clone()));

        Broker::from_parts(req_tx, history, token, join)
    }
}
