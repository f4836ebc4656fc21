//! Bounded queue + worker feeding a [`Transport`].

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::Event;

use super::Transport;

/// Best-effort pipe from the broker loop to a transport.
pub(crate) struct Forwarder {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

impl Forwarder {
    /// Spawns the forwarding worker.
    pub(crate) fn spawn(transport: Arc<dyn Transport>, capacity: usize) -> Self {
        let name = transport.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let id = ev.id.clone();
                let fut = transport.forward(ev);
                match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(
                            transport = name,
                            event_id = %id,
                            error = e.as_label(),
                            reason = %e.as_message(),
                            "transport dropped event"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(transport = name, event_id = %id, "transport panicked");
                    }
                }
            }
        });

        Self { name, tx, worker }
    }

    /// Queues a copy without waiting; drops it if the queue is full or closed.
    pub(crate) fn offer(&self, event: Arc<Event>) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(transport = self.name, event_id = %ev.id, "transport queue full; copy dropped");
            }
            Err(mpsc::error::TrySendError::Closed(ev)) => {
                tracing::debug!(transport = self.name, event_id = %ev.id, "transport worker gone; copy dropped");
            }
        }
    }

    /// Closes the queue and waits for the worker to drain it.
    pub(crate) async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
