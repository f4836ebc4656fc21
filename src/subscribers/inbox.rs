//! # Subscriber identity and inbox.
//!
//! A subscriber is the pair returned by [`channel`]:
//! - [`Subscriber`]: cloneable address handed to the broker on `subscribe*`
//! - [`Inbox`]: receiving end owned by the consuming worker
//!
//! ```text
//! Broker loop ── deliver(Arc<Event>) ──► Subscriber (unbounded tx) ──► Inbox::recv()
//!                                                                        │
//!                                          drop(Inbox) = termination ◄───┘
//! ```
//!
//! ## Rules
//! - **Fire-and-forget**: delivery never waits for the consumer.
//! - **Unbounded**: a slow consumer accumulates backlog in its own inbox.
//! - **Termination**: dropping the [`Inbox`] is what the broker's liveness watch
//!   observes; every subscription of that subscriber is then reaped.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::events::Event;

static SUBSCRIBER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(SUBSCRIBER_SEQ.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Address of a subscriber; what the broker stores in its indexes.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::UnboundedSender<Arc<Event>>,
}

impl Subscriber {
    /// Returns the subscriber identity.
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Returns `false` once the inbox has been dropped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Pushes an event into the inbox; `false` if the inbox is gone.
    #[inline]
    pub(crate) fn deliver(&self, event: &Arc<Event>) -> bool {
        self.tx.send(Arc::clone(event)).is_ok()
    }

    /// Completes when the inbox is dropped.
    pub(crate) async fn terminated(&self) {
        self.tx.closed().await;
    }
}

/// Receiving end of a subscriber.
#[derive(Debug)]
pub struct Inbox {
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<Arc<Event>>,
}

impl Inbox {
    /// Identity of the owning subscriber.
    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next delivered event.
    ///
    /// Returns `None` only when every [`Subscriber`] clone is gone and the
    /// backlog is drained.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.rx.recv().await
    }

    /// Takes the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.rx.try_recv().ok()
    }

    /// Number of queued, not yet received events.
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }
}

/// Creates a new subscriber address and its inbox.
pub fn channel() -> (Subscriber, Inbox) {
    let id = SubscriberId::next();
    let (tx, rx) = mpsc::unbounded_channel();
    (Subscriber { id, tx }, Inbox { id, rx })
}
