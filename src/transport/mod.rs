//! # Outbound transport.
//!
//! The broker hands a copy of every emitted event to an optional [`Transport`]
//! for delivery outside the process. Delivery is best-effort:
//!
//! ```text
//! Broker loop ── try_send(Arc<Event>) ──► [bounded queue] ──► forwarder worker ──► Transport::forward()
//!                 (full → copy dropped, warn)                   (Err / panic → logged, next event)
//! ```
//!
//! - The broker never awaits the transport.
//! - Errors and panics stay inside the forwarder worker.
//! - [`BusTransport`] republishes onto a `tokio::sync::broadcast` channel, for
//!   bridges that want to pull events instead of being called.

mod bus;
mod forwarder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::events::Event;

pub use bus::BusTransport;
pub(crate) use forwarder::Forwarder;

/// Contract for out-of-process delivery.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Delivers one event. The result is logged and otherwise ignored.
    async fn forward(&self, event: Arc<Event>) -> Result<(), TransportError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
