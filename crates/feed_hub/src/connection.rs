//! Connection identity and push sinks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_core::PriceUpdate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::TransportError;

/// Server-assigned connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Delivery endpoint of a live connection.
#[async_trait]
pub trait PushSink: Send + Sync {
    /// Deliver one update. The hub bounds the call with its send timeout.
    async fn send(&self, update: &PriceUpdate) -> Result<(), TransportError>;
}

/// Sink backed by a bounded channel drained by the connection's writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PriceUpdate>,
}

impl ChannelSink {
    /// Create a sink and the receiver its writer drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PriceUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PushSink for ChannelSink {
    async fn send(&self, update: &PriceUpdate) -> Result<(), TransportError> {
        self.tx
            .send(update.clone())
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// A registered connection and the symbols it wants.
pub struct Connection {
    /// Identifier
    pub id: ConnectionId,
    /// Registration time
    pub created_at: DateTime<Utc>,
    /// Subscribed symbols (normalised)
    pub symbols: HashSet<String>,
    pub(crate) sink: Arc<dyn PushSink>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, sink: Arc<dyn PushSink>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            symbols: HashSet::new(),
            sink,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("symbols", &self.symbols)
            .finish_non_exhaustive()
    }
}
