//! # Broadcast transport.
//!
//! [`BusTransport`] is a thin wrapper around [`tokio::sync::broadcast`]: every
//! forwarded event is republished to all current receivers.
//!
//! ## Rules
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No receivers**: `forward` reports [`TransportError::Unavailable`]; the copy is lost.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::events::Event;

use super::Transport;

/// Broadcast-channel transport.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct BusTransport {
    tx: broadcast::Sender<Arc<Event>>,
}

impl BusTransport {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Creates a new receiver that will observe subsequently forwarded events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl Transport for BusTransport {
    async fn forward(&self, event: Arc<Event>) -> Result<(), TransportError> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| TransportError::Unavailable {
                reason: "no receivers".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "BusTransport"
    }
}
