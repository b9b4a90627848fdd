//! Transport seam of the client.
//!
//! The automaton only needs to open a session, write control frames and
//! heartbeats, and read server messages. Anything that can do that can
//! carry the feed.

use async_trait::async_trait;
use feed_core::wire::{ControlMessage, ServerMessage};

use crate::error::ClientError;

/// Opens sessions to a feed server.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Session type produced by this connector
    type Session: Session;

    /// Open a new session to `url`
    async fn connect(&self, url: &str) -> Result<Self::Session, ClientError>;
}

/// An open, bidirectional session.
#[async_trait]
pub trait Session: Send + 'static {
    /// Write one control request
    async fn send_control(&mut self, message: &ControlMessage) -> Result<(), ClientError>;

    /// Write a keep-alive
    async fn heartbeat(&mut self) -> Result<(), ClientError>;

    /// Next server message; `Ok(None)` once the peer has closed the session.
    ///
    /// Must be cancel safe: the client drops a pending call whenever a
    /// command or heartbeat is due.
    async fn next_event(&mut self) -> Result<Option<ServerMessage>, ClientError>;

    /// Close the session
    async fn close(&mut self);
}
