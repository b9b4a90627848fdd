//! # feed_client: Reconnecting subscriber for the tickstream feed
//!
//! [`StreamClient`] runs a small state machine on its own task:
//! connect, replay the desired subscriptions, keep the session alive with
//! heartbeats, and on failure retry after a fixed backoff up to a bounded
//! number of attempts. The transport is behind the [`Connector`] and
//! [`Session`] traits; [`WsConnector`] is the WebSocket implementation.
//!
//! ```rust,no_run
//! use feed_client::{ClientConfig, StreamClient, WsConnector};
//! use feed_core::wire::ServerMessage;
//!
//! # async fn demo() -> Result<(), feed_client::ClientError> {
//! let config = ClientConfig::new("ws://127.0.0.1:8080/ws");
//! let (client, mut events) = StreamClient::spawn(WsConnector, config);
//! client.subscribe(["TCS", "INFY"])?;
//!
//! while let Some(message) = events.recv().await {
//!     if let ServerMessage::PriceUpdate(update) = message {
//!         println!("{} {:.2}", update.symbol, update.price);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod client;
pub mod error;
pub mod transport;
pub mod ws;

pub use client::{ClientConfig, ClientState, StreamClient};
pub use error::ClientError;
pub use transport::{Connector, Session};
pub use ws::{WsConnector, WsSession};
