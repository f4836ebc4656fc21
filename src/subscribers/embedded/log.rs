//! # LogWriter: delivery logger
//!
//! A minimal [`Subscribe`] handler that logs every delivered [`Event`] through
//! `tracing` at `info` level. Use it for demos or to eyeball traffic.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO evbroker::log: event delivered event_type="demo.ping" event_id=7c1e… source="pinger"
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Delivery logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        tracing::info!(
            target: "evbroker::log",
            event_type = %e.kind,
            event_id = %e.id,
            source = e.source.as_deref().unwrap_or("-"),
            "event delivered"
        );
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
