//! # Dedicated worker per subscriber.
//!
//! ```text
//! spawn_subscriber(handler)
//!     ├─► channel() ──► (Subscriber, Inbox)
//!     └─► tokio::spawn(loop {
//!             select! {
//!                 token.cancelled() ─► break
//!                 inbox.recv()      ─► handler.on_event(&ev)   (panic → warn, continue)
//!             }
//!         })
//!         └─► on exit the Inbox is dropped → broker reaps all subscriptions
//! ```
//!
//! ## Rules
//! - **Per-subscriber FIFO**: events are handled in delivery order.
//! - **Isolation**: a panicking handler only loses the event it panicked on.
//!   `AssertUnwindSafe` is used, so state behind an `Arc<Mutex<T>>` can be left
//!   inconsistent if the handler panics while holding the lock.
//! - **Stop**: [`SubscriberHandle::stop`] abandons any queued backlog.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::inbox::{Subscriber, SubscriberId, channel};
use super::subscribe::Subscribe;

/// Owner handle of a running subscriber worker.
pub struct SubscriberHandle {
    name: &'static str,
    subscriber: Subscriber,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Address to pass to `Broker::subscribe*`.
    #[inline]
    pub fn subscriber(&self) -> &Subscriber {
        &self.subscriber
    }

    /// Identity of the subscriber.
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// Handler name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` once the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// The inbox is dropped on exit, which the broker observes as termination.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(subscriber = self.name, error = %e, "subscriber worker aborted");
        }
    }
}

/// Spawns a worker task that feeds `handler` from a fresh inbox.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_subscriber(handler: Arc<dyn Subscribe>) -> SubscriberHandle {
    let name = handler.name();
    let (subscriber, mut inbox) = channel();
    let token = CancellationToken::new();
    let stop = token.clone();

    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                msg = inbox.recv() => {
                    let Some(ev) = msg else { break };
                    let fut = handler.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::warn!(
                            subscriber = handler.name(),
                            event_id = %ev.id,
                            info = %panic_message(&*panic_err),
                            "subscriber panicked"
                        );
                    }
                }
            }
        }
        tracing::debug!(subscriber = handler.name(), "subscriber worker stopped");
    });

    SubscriberHandle {
        name,
        subscriber,
        token,
        join,
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
