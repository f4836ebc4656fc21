//! Match-cost metrics.
//!
//! - [`MetricsSink`] outbound hook, called per pattern evaluation and per emit
//! - [`MatchSample`], [`DispatchSample`] the reported records
//! - [`TracingMetrics`] default sink (trace events)
//! - [`MatchStats`] atomic in-memory aggregate

mod sink;
mod stats;

pub use sink::{DispatchSample, MatchSample, MetricsSink, TracingMetrics};
pub use stats::{MatchStats, StatsSnapshot};
