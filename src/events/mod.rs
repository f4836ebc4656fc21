//! Event data model.
//!
//! ## Contents
//! - [`Event`] immutable message instance (id, type, source, payload, metadata, timestamp)
//! - [`Metadata`] string-keyed attribute map
//!
//! Events are built by publishers (or by [`Broker::emit`](crate::Broker::emit)),
//! queued to the broker loop, and shared as `Arc<Event>` from then on.

mod event;

pub use event::{Event, Metadata};
