//! WebSocket transport.

use async_trait::async_trait;
use feed_core::wire::{ControlMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::transport::{Connector, Session};

/// Connects with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

/// An open WebSocket session.
pub struct WsSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connector for WsConnector {
    type Session = WsSession;

    async fn connect(&self, url: &str) -> Result<WsSession, ClientError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        debug!(url, status = %response.status(), "websocket connected");
        Ok(WsSession { stream })
    }
}

#[async_trait]
impl Session for WsSession {
    async fn send_control(&mut self, message: &ControlMessage) -> Result<(), ClientError> {
        let text = serde_json::to_string(message).map_err(|e| ClientError::Send(e.to_string()))?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| ClientError::Send(e.to_string()))
    }

    async fn heartbeat(&mut self) -> Result<(), ClientError> {
        self.stream
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| ClientError::Send(e.to_string()))
    }

    async fn next_event(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame.map_err(|e| ClientError::Transport(e.to_string()))? {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(error) => warn!(%error, "ignoring undecodable server message"),
                },
                Message::Close(frame) => {
                    debug!(?frame, "server closed websocket");
                    return Ok(None);
                }
                Message::Binary(_) | Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) {
        if let Err(error) = self.stream.close(None).await {
            debug!(%error, "websocket close failed");
        }
    }
}
