//! Wildcard patterns over event types.
//!
//! - [`matches`] the reference matcher on raw strings
//! - [`Pattern`] the same rules, split once at subscribe time
//!
//! Evaluations performed by the broker go through an internal timer that
//! reports each one to the configured [`MetricsSink`](crate::metrics::MetricsSink).

mod instrument;
mod matcher;

pub(crate) use instrument::MatchTimer;
pub use matcher::{Pattern, matches};
