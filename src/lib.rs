//! # evbroker
//!
//! **evbroker** is an in-process publish/subscribe broker for async Rust.
//!
//! Workers emit typed events; other workers subscribe to an exact event type or
//! to a wildcard pattern over types. Subscriptions are tied to the subscriber's
//! lifetime and are removed automatically when it terminates. A bounded history
//! keeps the most recent events for replay and debugging, and every pattern
//! evaluation is timed and reported.
//!
//! ## Architecture
//! ```text
//!   Publisher / Broker::emit          Broker::subscribe{,_pattern}(key, &Subscriber)
//!            │                                     │
//!            ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  request queue (unbounded, FIFO)                                  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  BrokerLoop (single writer)                                       │
//! │  - exact index:   type    → [Entry{subscriber, watch}]            │
//! │  - pattern index: pattern → (Pattern, [Entry])                    │
//! │  - history:       VecDeque<Arc<Event>> (≤ max_history)            │
//! │  - watcher:       WatchRef → liveness task                        │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!   exact entries     MatchTimer(pattern)   MetricsSink    Forwarder ──► Transport
//!        │             timed, warn if slow                  (best-effort)
//!        ▼                  ▼
//!   Subscriber ──► Inbox (unbounded) ──► your loop | Subscribe worker
//!                    │
//!                    └─ dropped ──► watch fires ──► down queue ──► reaper sweep
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                      |
//! |-------------------|-------------------------------------------------------------|-----------------------------------------|
//! | **Broker**        | Emit, subscribe, unsubscribe, history, snapshot, shutdown.  | [`Broker`], [`Publisher`]               |
//! | **Patterns**      | Prefix/suffix wildcards without a regex engine.             | [`pattern::matches`], [`Pattern`]       |
//! | **Subscribers**   | Inbox channels or worker-driven handlers.                   | [`Subscriber`], [`Inbox`], [`Subscribe`]|
//! | **Metrics**       | Per-evaluation and per-emit samples.                        | [`MetricsSink`], [`MatchStats`]         |
//! | **Transport**     | Best-effort copy of every event to an external sink.        | [`Transport`], [`BusTransport`]         |
//! | **Configuration** | History size, slow-match threshold, transport queue.        | [`BrokerConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a [`LogWriter`](subscribers::LogWriter) subscriber that logs deliveries.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use evbroker::{Broker, BrokerConfig, Metadata, MatchStats, subscribers};
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stats = Arc::new(MatchStats::new());
//!     let broker = Broker::builder(BrokerConfig::default())
//!         .with_metrics(stats.clone())
//!         .build();
//!
//!     let (sub, mut inbox) = subscribers::channel();
//!     broker.subscribe("demo.ping", &sub).await?;
//!     broker.subscribe_pattern("demo.*", &sub).await?;
//!
//!     broker.publisher("pinger").emit("demo.ping", json!({"n": 1}), Metadata::new())?;
//!
//!     // One delivery through the exact index, one through the pattern.
//!     let a = inbox.recv().await.expect("exact delivery");
//!     let b = inbox.recv().await.expect("pattern delivery");
//!     assert_eq!(a.id, b.id);
//!     assert_eq!(a.source.as_deref(), Some("pinger"));
//!
//!     broker.shutdown().await;
//!     assert_eq!(stats.snapshot().matches, 1);
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
pub mod metrics;
pub mod pattern;
pub mod subscribers;
mod transport;

// ---- Public re-exports ----

pub use self::core::{Broker, BrokerBuilder, BrokerConfig, IndexSnapshot, Publisher};
pub use error::{BrokerError, TransportError};
pub use events::{Event, Metadata};
pub use metrics::{MatchStats, MetricsSink};
pub use pattern::Pattern;
pub use subscribers::{Inbox, Subscribe, Subscriber, SubscriberHandle, SubscriberId, spawn_subscriber};
pub use transport::{BusTransport, Transport};
