//! Broker core: state ownership and request serialization.
//!
//! The only public API from this module is [`Broker`] (plus its builder,
//! config and snapshot types).
//!
//! Internal modules:
//! - [`runtime`]: the broker loop, single writer of all state;
//! - [`index`]: exact and pattern subscription indexes, reaper sweep;
//! - [`watch`]: liveness watches on subscribers;
//! - [`history`]: bounded replay buffer;
//! - [`builder`]: wiring of loop, collaborators and handle.

mod broker;
mod builder;
mod config;
mod history;
mod index;
mod runtime;
mod watch;

pub use broker::{Broker, IndexSnapshot, Publisher};
pub use builder::BrokerBuilder;
pub use config::BrokerConfig;
