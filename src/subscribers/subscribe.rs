//! # Handler trait for worker-driven subscribers
//!
//! `Subscribe` is the extension point for plugging an async handler into the
//! broker without managing an [`Inbox`](super::Inbox) by hand.
//! [`spawn_subscriber`](super::spawn_subscriber) gives each handler a dedicated
//! worker task draining its own inbox.
//!
//! ## Contract
//! - Implementations may be slow; they never block the broker loop or other
//!   subscribers, they only grow their own backlog.
//! - A panic inside `on_event` is caught and logged; the worker moves on to the
//!   next event.
//!
//! ## Example
//! ```rust
//! use evbroker::{Event, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         let _ = (&ev.id, &ev.kind);
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for worker-driven subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single delivered event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
