//! # Events published through the broker.
//!
//! An [`Event`] is created once at emit time and never mutated afterwards; the
//! broker shares it as `Arc<Event>` between the history buffer, every matching
//! subscriber inbox and the outbound transport.
//!
//! ## Fields
//! - `id`: opaque unique string (UUID v4 text), stamped by [`Event::new`] and
//!   again when the broker emits it
//! - `kind`: event type; serialized as `"type"`. Only the pattern matcher looks inside it
//! - `source`: publisher identity, `None` for anonymous emits
//! - `data`: opaque JSON payload
//! - `metadata`: string-keyed map of extra attributes
//! - `timestamp`: wall-clock time of emission
//!
//! ## Example
//! ```rust
//! use evbroker::Event;
//! use serde_json::json;
//!
//! let ev = Event::new("demo.ping", json!({"n": 1}))
//!     .with_source("pinger")
//!     .with_metadata("trace", json!("abc"));
//!
//! assert_eq!(ev.kind, "demo.ping");
//! assert_eq!(ev.source.as_deref(), Some("pinger"));
//! assert_eq!(ev.metadata.get("trace"), Some(&json!("abc")));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// String-keyed event attributes.
pub type Metadata = BTreeMap<String, Value>;

/// A single broadcast message instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id of this emitted instance.
    pub id: String,
    /// Event type, e.g. `"demo.ping"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Identity of the publisher, if known.
    pub source: Option<Arc<str>>,
    /// Opaque payload.
    pub data: Value,
    /// Extra attributes.
    pub metadata: Metadata,
    /// Wall-clock creation time.
    pub timestamp: SystemTime,
}

impl Event {
    /// Creates a new event with a fresh id and the current timestamp.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            id: next_event_id(),
            kind: kind.into(),
            source: None,
            data,
            metadata: Metadata::new(),
            timestamp: SystemTime::now(),
        }
    }

    /// Attaches a publisher identity.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds (or replaces) a single metadata attribute.
    #[inline]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Merges a whole metadata map; keys already present are overwritten.
    #[inline]
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Gives the event a fresh id and the current timestamp.
    ///
    /// Applied to every event entering the broker, so a cloned or deserialized
    /// event never reuses an id that was already emitted.
    pub(crate) fn stamped(mut self) -> Self {
        self.id = next_event_id();
        self.timestamp = SystemTime::now();
        self
    }
}

/// Generates an opaque unique event id.
fn next_event_id() -> String {
    Uuid::new_v4().to_string()
}
