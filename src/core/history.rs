//! # Bounded replay history.
//!
//! FIFO of the most recently emitted events. The broker loop is the only
//! writer; readers take a snapshot under the read lock, so they can run
//! concurrently with emits and never see a push without its trim.
//!
//! ## Rules
//! - After every push: `len <= max` (oldest evicted first).
//! - `max = 0` keeps nothing.
//! - `recent(limit)` returns the newest `min(limit, len)` events, oldest first.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::events::Event;

/// Shared handle to the history buffer.
#[derive(Clone)]
pub(crate) struct History {
    events: Arc<RwLock<VecDeque<Arc<Event>>>>,
    max: usize,
}

impl History {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(max.min(4096)))),
            max,
        }
    }

    /// Appends an event and trims the front down to `max`.
    pub(crate) async fn push(&self, event: Arc<Event>) {
        let mut events = self.events.write().await;
        events.push_back(event);
        while events.len() > self.max {
            events.pop_front();
        }
    }

    /// Returns the newest `min(limit, len)` events, oldest first.
    pub(crate) async fn recent(&self, limit: usize) -> Vec<Arc<Event>> {
        let events = self.events.read().await;
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub(crate) async fn clear(&self) {
        self.events.write().await.clear();
    }
}
