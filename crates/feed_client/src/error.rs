//! Client error types.

use thiserror::Error;

/// Failures seen by the reconnecting client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Could not establish a session
    #[error("connect failed: {0}")]
    Connect(String),

    /// Could not write to the session
    #[error("send failed: {0}")]
    Send(String),

    /// Reading from the session failed
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be decoded
    #[error("decode failed: {0}")]
    Decode(String),

    /// The server closed the session
    #[error("session closed by peer")]
    Closed,

    /// The client task is no longer running
    #[error("client task stopped")]
    Stopped,
}
