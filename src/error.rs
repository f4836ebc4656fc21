//! Error types used by the broker and its transport boundary.
//!
//! - [`BrokerError`]: returned by [`Broker`](crate::Broker) operations.
//! - [`TransportError`]: returned by [`Transport`](crate::Transport) implementations.
//!
//! Under normal operation nothing fails: missing subscribers, unknown types and
//! unknown patterns are successful no-ops. The only broker-side error is talking
//! to a broker whose loop has already stopped. Transport errors never leave the
//! forwarding worker; they are logged and dropped there.

use thiserror::Error;

/// # Errors produced by broker operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker loop has stopped (after `shutdown` or once every handle is gone).
    #[error("broker is closed")]
    Closed,
}

impl BrokerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use evbroker::BrokerError;
    ///
    /// assert_eq!(BrokerError::Closed.as_label(), "broker_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::Closed => "broker_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BrokerError::Closed => "broker loop is not running".to_string(),
        }
    }
}

/// # Errors reported by an outbound transport.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Transport cannot accept events right now (no peers, link down).
    #[error("transport unavailable: {reason}")]
    Unavailable {
        /// Why the transport is unavailable.
        reason: String,
    },

    /// Transport refused this particular event.
    #[error("event rejected: {reason}")]
    Rejected {
        /// Why the event was rejected.
        reason: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use evbroker::TransportError;
    ///
    /// let err = TransportError::Unavailable { reason: "no peers".into() };
    /// assert_eq!(err.as_label(), "transport_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Unavailable { .. } => "transport_unavailable",
            TransportError::Rejected { .. } => "transport_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TransportError::Unavailable { reason } => format!("unavailable: {reason}"),
            TransportError::Rejected { reason } => format!("rejected: {reason}"),
        }
    }
}
