//! # Broker: the public handle to the event broker.
//!
//! [`Broker`] is a cheap, cloneable handle. All clones talk to one broker task,
//! the only owner of the subscription indexes.
//!
//! ## Operations
//! | Operation                | Path                 | Waits for            |
//! |--------------------------|----------------------|----------------------|
//! | `emit` / `publish`       | request queue        | nothing (queued)     |
//! | `subscribe*`             | request queue        | ack from the loop    |
//! | `unsubscribe*`           | request queue        | ack (removed count)  |
//! | `snapshot`               | request queue        | reply from the loop  |
//! | `get_history`            | shared history lock  | read lock only       |
//!
//! Requests from one handle are applied in the order they were made, so an
//! awaited `subscribe` is in effect for every later `emit`.
//!
//! ## Example
//! ```rust
//! use evbroker::{Broker, BrokerConfig, Metadata, subscribers};
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), evbroker::BrokerError> {
//!     let broker = Broker::new(BrokerConfig::default());
//!     let (sub, mut inbox) = subscribers::channel();
//!
//!     broker.subscribe_pattern("demo.*", &sub).await?;
//!     let id = broker.emit("demo.ping", json!({"n": 1}), Metadata::new())?;
//!
//!     let ev = inbox.recv().await.expect("delivered");
//!     assert_eq!(ev.id, id);
//!
//!     broker.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::BrokerError;
use crate::events::{Event, Metadata};
use crate::subscribers::{Subscriber, SubscriberId};

use super::builder::BrokerBuilder;
use super::config::BrokerConfig;
use super::history::History;
use super::runtime::{Request, Scope};

/// Point-in-time view of both subscription indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    /// Exact event type → subscriber ids (one per entry, duplicates kept).
    pub exact: BTreeMap<String, Vec<SubscriberId>>,
    /// Raw pattern → subscriber ids.
    pub patterns: BTreeMap<String, Vec<SubscriberId>>,
    /// Active liveness watches.
    pub watches: usize,
    /// Events currently retained in history.
    pub history_len: usize,
}

impl IndexSnapshot {
    /// Returns `true` if `id` appears under any key of either index.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.exact
            .values()
            .chain(self.patterns.values())
            .any(|ids| ids.contains(&id))
    }

    /// Returns `true` if neither index has any key.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }

    /// Total number of subscription entries.
    pub fn entry_count(&self) -> usize {
        self.exact
            .values()
            .chain(self.patterns.values())
            .map(Vec::len)
            .sum()
    }
}

struct Inner {
    requests: mpsc::UnboundedSender<Request>,
    history: History,
    token: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to a running broker.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<Inner>,
}

impl Broker {
    /// Returns a builder for attaching a transport or metrics sink.
    pub fn builder(cfg: BrokerConfig) -> BrokerBuilder {
        BrokerBuilder::new(cfg)
    }

    /// Starts a broker with default collaborators.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: BrokerConfig) -> Self {
        Self::builder(cfg).build()
    }

    pub(crate) fn from_parts(
        requests: mpsc::UnboundedSender<Request>,
        history: History,
        token: CancellationToken,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                requests,
                history,
                token,
                join: Mutex::new(Some(join)),
            }),
        }
    }

    /// Emits a new anonymous event and returns its id.
    ///
    /// Returns as soon as the event is queued; delivery is asynchronous and
    /// unacknowledged. Having no subscribers is not an error.
    pub fn emit(
        &self,
        event_type: impl Into<String>,
        data: Value,
        metadata: Metadata,
    ) -> Result<String, BrokerError> {
        self.publish(Event::new(event_type, data).with_metadata_map(metadata))
    }

    /// Queues a prepared event and returns the id it was emitted under.
    ///
    /// The event is restamped with a fresh id and the current time; type,
    /// source, data and metadata are kept as given.
    pub fn publish(&self, event: Event) -> Result<String, BrokerError> {
        let event = event.stamped();
        let id = event.id.clone();
        self.send(Request::Emit(Arc::new(event)))?;
        Ok(id)
    }

    /// Returns a publisher that stamps `source` on everything it emits.
    pub fn publisher(&self, source: impl Into<Arc<str>>) -> Publisher {
        Publisher {
            broker: self.clone(),
            source: source.into(),
        }
    }

    /// Subscribes to one exact event type.
    ///
    /// Calling it twice for the same type and subscriber registers two entries,
    /// and each emit is then delivered twice.
    pub async fn subscribe(
        &self,
        event_type: impl Into<String>,
        subscriber: &Subscriber,
    ) -> Result<(), BrokerError> {
        self.add(Scope::Exact, event_type.into(), subscriber).await
    }

    /// Subscribes to every event type matched by `pattern`.
    ///
    /// See [`pattern::matches`](crate::pattern::matches) for the matching rules.
    pub async fn subscribe_pattern(
        &self,
        pattern: impl Into<String>,
        subscriber: &Subscriber,
    ) -> Result<(), BrokerError> {
        self.add(Scope::Pattern, pattern.into(), subscriber).await
    }

    /// Removes every entry of `subscriber` under `event_type`; returns how many.
    pub async fn unsubscribe(
        &self,
        event_type: &str,
        subscriber: &Subscriber,
    ) -> Result<usize, BrokerError> {
        self.remove(Scope::Exact, event_type, subscriber.id()).await
    }

    /// Removes every entry of `subscriber` under `pattern`; returns how many.
    pub async fn unsubscribe_pattern(
        &self,
        pattern: &str,
        subscriber: &Subscriber,
    ) -> Result<usize, BrokerError> {
        self.remove(Scope::Pattern, pattern, subscriber.id()).await
    }

    /// Returns the newest `min(limit, len)` events, oldest first.
    ///
    /// Reads a snapshot of the history without going through the request queue.
    pub async fn get_history(&self, limit: usize) -> Vec<Arc<Event>> {
        self.inner.history.recent(limit).await
    }

    /// Returns a consistent view of both indexes.
    ///
    /// Served by the broker loop, so it reflects every request queued before it.
    pub async fn snapshot(&self) -> Result<IndexSnapshot, BrokerError> {
        self.request(|reply| Request::Snapshot { reply }).await
    }

    /// Stops the broker loop and waits for it to finish.
    ///
    /// All subscriptions and history are discarded. Later calls on any clone
    /// fail with [`BrokerError::Closed`].
    pub async fn shutdown(&self) {
        self.inner.token.cancel();
        let join = self.inner.join.lock().await.take();
        if let Some(join) = join
            && let Err(e) = join.await
        {
            tracing::warn!(error = %e, "broker loop aborted");
        }
    }

    /// Returns `true` once the broker loop has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.inner.requests.is_closed()
    }

    async fn add(
        &self,
        scope: Scope,
        key: String,
        subscriber: &Subscriber,
    ) -> Result<(), BrokerError> {
        let subscriber = subscriber.clone();
        self.request(|ack| Request::Subscribe {
            scope,
            key,
            subscriber,
            ack,
        })
        .await
    }

    async fn remove(
        &self,
        scope: Scope,
        key: &str,
        subscriber: SubscriberId,
    ) -> Result<usize, BrokerError> {
        self.request(|ack| Request::Unsubscribe {
            scope,
            key: key.to_owned(),
            subscriber,
            ack,
        })
        .await
    }

    fn send(&self, req: Request) -> Result<(), BrokerError> {
        self.inner
            .requests
            .send(req)
            .map_err(|_| BrokerError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await.map_err(|_| BrokerError::Closed)
    }
}

/// Emitting handle bound to a publisher identity.
#[derive(Clone)]
pub struct Publisher {
    broker: Broker,
    source: Arc<str>,
}

impl Publisher {
    /// Publisher identity stamped on every event.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Emits an event with this publisher as its source.
    pub fn emit(
        &self,
        event_type: impl Into<String>,
        data: Value,
        metadata: Metadata,
    ) -> Result<String, BrokerError> {
        self.publish(Event::new(event_type, data).with_metadata_map(metadata))
    }

    /// Queues a prepared event, overriding its source.
    pub fn publish(&self, event: Event) -> Result<String, BrokerError> {
        self.broker
            .publish(event.with_source(Arc::clone(&self.source)))
    }
}
