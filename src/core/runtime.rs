//! # Broker loop: the single writer of subscription state.
//!
//! ```text
//! Broker handles (many) ── Request ──► [unbounded queue] ──┐
//! Watch tasks (many) ───── WatchRef ─► [down queue] ───────┼──► BrokerLoop::run()
//! Broker::shutdown() ───── token.cancel() ─────────────────┘      │
//!                                                                 ├─ Emit       → dispatch()
//!                                                                 ├─ Subscribe  → watch + insert
//!                                                                 ├─ Unsubscribe→ remove + release
//!                                                                 ├─ Snapshot   → read indexes
//!                                                                 └─ WatchRef   → reap()
//! ```
//!
//! ## Dispatch order for one event
//! 1. push into history (trimmed to `max_history`)
//! 2. deliver to every entry under `exact[event.kind]`
//! 3. evaluate every pattern key (timed), deliver to entries of matching keys
//! 4. report a [`DispatchSample`]
//! 5. offer a copy to the transport forwarder
//!
//! Termination reports are polled before regular requests, and the loop
//! exits on cancellation or when every broker handle has been dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::metrics::DispatchSample;
use crate::pattern::{MatchTimer, Pattern};
use crate::subscribers::{Subscriber, SubscriberId};
use crate::transport::Forwarder;

use super::broker::IndexSnapshot;
use super::history::History;
use super::index::{Entry, SubscriptionIndex};
use super::watch::{WatchRef, Watcher};

/// Which index a subscription request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Exact,
    Pattern,
}

impl Scope {
    fn as_str(self) -> &'static str {
        match self {
            Scope::Exact => "exact",
            Scope::Pattern => "pattern",
        }
    }
}

/// Mutating (and snapshot) requests, executed strictly in arrival order.
pub(crate) enum Request {
    Emit(Arc<Event>),
    Subscribe {
        scope: Scope,
        key: String,
        subscriber: Subscriber,
        ack: oneshot::Sender<()>,
    },
    Unsubscribe {
        scope: Scope,
        key: String,
        subscriber: SubscriberId,
        ack: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<IndexSnapshot>,
    },
}

/// State owned by the broker task.
pub(crate) struct BrokerLoop {
    exact: SubscriptionIndex,
    patterns: SubscriptionIndex<Pattern>,
    history: History,
    watcher: Watcher,
    timer: MatchTimer,
    forwarder: Option<Forwarder>,
}

impl BrokerLoop {
    pub(crate) fn new(
        history: History,
        watcher: Watcher,
        timer: MatchTimer,
        forwarder: Option<Forwarder>,
    ) -> Self {
        Self {
            exact: SubscriptionIndex::new(),
            patterns: SubscriptionIndex::new(),
            history,
            watcher,
            timer,
            forwarder,
        }
    }

    /// Drains requests and termination reports until cancelled or orphaned.
    pub(crate) async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut downs: mpsc::UnboundedReceiver<WatchRef>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(watch) = downs.recv() => self.reap(watch),
                req = requests.recv() => match req {
                    Some(req) => self.handle(req).await,
                    None => break,
                },
            }
        }
        self.stop().await;
    }

    async fn handle(&mut self, req: Request) {
        match req {
            Request::Emit(event) => self.dispatch(event).await,
            Request::Subscribe {
                scope,
                key,
                subscriber,
                ack,
            } => {
                self.subscribe(scope, key, subscriber);
                let _ = ack.send(());
            }
            Request::Unsubscribe {
                scope,
                key,
                subscriber,
                ack,
            } => {
                let removed = self.unsubscribe(scope, &key, subscriber);
                let _ = ack.send(removed);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(self.snapshot().await);
            }
        }
    }

    async fn dispatch(&mut self, event: Arc<Event>) {
        let started = Instant::now();
        self.history.push(Arc::clone(&event)).await;

        let exact_deliveries = deliver(self.exact.get(&event.kind), &event);

        let mut patterns_evaluated = 0;
        let mut pattern_deliveries = 0;
        for (_, pattern, entries) in self.patterns.iter() {
            patterns_evaluated += 1;
            if self.timer.evaluate(pattern, &event.kind) {
                pattern_deliveries += deliver(entries, &event);
            }
        }

        self.timer.dispatched(&DispatchSample {
            event_type: &event.kind,
            exact_deliveries,
            pattern_deliveries,
            patterns_evaluated,
            elapsed: started.elapsed(),
        });

        if let Some(fwd) = &self.forwarder {
            fwd.offer(event);
        }
    }

    fn subscribe(&mut self, scope: Scope, key: String, subscriber: Subscriber) {
        let id = subscriber.id();
        let watch = self.watcher.watch(&subscriber);
        let entry = Entry { subscriber, watch };
        match scope {
            Scope::Exact => self.exact.insert_with(&key, entry, || ()),
            Scope::Pattern => self
                .patterns
                .insert_with(&key, entry, || Pattern::compile(&key)),
        }
        tracing::debug!(scope = scope.as_str(), key = %key, subscriber = %id, %watch, "subscribed");
    }

    fn unsubscribe(&mut self, scope: Scope, key: &str, subscriber: SubscriberId) -> usize {
        let watches = match scope {
            Scope::Exact => self.exact.remove_subscriber(key, subscriber),
            Scope::Pattern => self.patterns.remove_subscriber(key, subscriber),
        };
        for watch in &watches {
            self.watcher.release(*watch);
        }
        tracing::debug!(
            scope = scope.as_str(),
            key,
            subscriber = %subscriber,
            removed = watches.len(),
            "unsubscribed"
        );
        watches.len()
    }

    fn reap(&mut self, watch: WatchRef) {
        self.watcher.forget(watch);
        let reaped = self.exact.reap(watch) + self.patterns.reap(watch);
        tracing::debug!(
            %watch,
            reaped,
            remaining = self.exact.entry_count() + self.patterns.entry_count(),
            "subscriber terminated"
        );
    }

    async fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            exact: self.exact.snapshot(),
            patterns: self.patterns.snapshot(),
            watches: self.watcher.len(),
            history_len: self.history.len().await,
        }
    }

    async fn stop(mut self) {
        tracing::debug!(
            keys = self.exact.key_count() + self.patterns.key_count(),
            watches = self.watcher.len(),
            "broker loop stopping"
        );
        self.watcher.release_all();
        self.exact.clear();
        self.patterns.clear();
        self.history.clear().await;
        if let Some(fwd) = self.forwarder.take() {
            fwd.shutdown().await;
        }
    }
}

/// Pushes `event` to every entry; returns how many inboxes accepted it.
fn deliver(entries: &[Entry], event: &Arc<Event>) -> usize {
    entries
        .iter()
        .filter(|e| e.subscriber.deliver(event))
        .count()
}
