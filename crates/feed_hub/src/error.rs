//! Error types for the distribution kernel.

use feed_core::CoreError;
use thiserror::Error;

use crate::connection::ConnectionId;

/// Registry and subscription errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HubError {
    /// No live connection with this id
    #[error("connection not found: {0}")]
    NotFound(ConnectionId),

    /// Connection id is already registered
    #[error("connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),

    /// A control request named no symbols
    #[error("no symbols given")]
    EmptySymbols,

    /// Symbol failed validation
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The hub has been shut down
    #[error("stream hub is shut down")]
    ShutDown,
}

impl HubError {
    /// Errors caused by malformed caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptySymbols | Self::Core(_))
    }
}

/// Failure to deliver to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Receiving side is gone
    #[error("transport closed")]
    Closed,

    /// Send did not complete within the delivery timeout
    #[error("send timed out")]
    Timeout,

    /// Any other transport failure
    #[error("transport error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(HubError::EmptySymbols.is_validation());
        assert!(HubError::Core(CoreError::InvalidSymbol("?".into())).is_validation());
        assert!(!HubError::NotFound(ConnectionId::new()).is_validation());
        assert!(!HubError::ShutDown.is_validation());
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::Timeout.to_string(), "send timed out");
    }
}
