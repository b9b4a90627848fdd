//! Messages exchanged between the feed server and its clients.
//!
//! Client → server: [`ControlMessage`]
//! ```json
//! {"action":"subscribe","symbols":["TCS","INFY"],"connectionId":"..."}
//! ```
//!
//! Server → client: [`ServerMessage`], tagged by `type`
//! ```json
//! {"type":"price_update","symbol":"TCS","price":3901.2,"change":1.2,
//!  "changePercent":0.03,"volume":52000,"timestamp":1718000000000}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::PriceUpdate;

/// Subscription control verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Add symbols to the connection's subscription set
    Subscribe,
    /// Remove symbols from the connection's subscription set
    Unsubscribe,
}

/// Subscription control request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMessage {
    /// Verb
    pub action: ControlAction,
    /// Symbols to add or remove
    pub symbols: Vec<String>,
    /// Target connection; optional on a WebSocket, where it defaults to the socket itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

impl ControlMessage {
    /// Build a subscribe request.
    pub fn subscribe<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: ControlAction::Subscribe,
            symbols: symbols.into_iter().map(Into::into).collect(),
            connection_id: None,
        }
    }

    /// Build an unsubscribe request.
    pub fn unsubscribe<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action: ControlAction::Unsubscribe,
            symbols: symbols.into_iter().map(Into::into).collect(),
            connection_id: None,
        }
    }
}

/// Outcome of a control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    /// Whether the request was applied
    pub success: bool,
    /// Human readable outcome
    pub message: String,
}

impl ControlResponse {
    /// Successful outcome
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Messages pushed by the server over a stream connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the connection is registered
    #[serde(rename_all = "camelCase")]
    Connected {
        /// Server-assigned connection id
        connection_id: String,
    },
    /// Reply to a control message sent on the same socket
    ControlResult(ControlResponse),
    /// Price tick for a subscribed symbol
    PriceUpdate(PriceUpdate),
}

impl ServerMessage {
    /// Serialise to a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
