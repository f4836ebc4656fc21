//! # Subscribers
//!
//! Two ways to consume events:
//! - **Manual**: [`channel`] returns a [`Subscriber`] address and an [`Inbox`];
//!   the caller drives `inbox.recv()` itself.
//! - **Worker**: implement [`Subscribe`] and hand it to [`spawn_subscriber`];
//!   a dedicated task drains the inbox and calls `on_event`.
//!
//! ```text
//! Broker loop ──► Subscriber ──► Inbox ──► (your loop | worker ─► Subscribe::on_event)
//! ```
//!
//! Either way, the subscriber's lifetime is its inbox: drop it (or stop the
//! worker) and the broker removes every subscription that pointed at it.

#[cfg(feature = "logging")]
mod embedded;
mod inbox;
mod subscribe;
mod worker;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use inbox::{Inbox, Subscriber, SubscriberId, channel};
pub use subscribe::Subscribe;
pub use worker::{SubscriberHandle, spawn_subscriber};
