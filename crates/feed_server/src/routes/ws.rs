//! WebSocket price stream.
//!
//! ## Protocol
//!
//! - On upgrade the server registers the socket and sends
//!   `{"type":"connected","connectionId":"..."}`.
//! - Client text frames carry control requests
//!   (`{"action":"subscribe","symbols":["TCS"]}`) and are answered with
//!   `{"type":"control_result","success":...,"message":...}`.
//! - Ticks for subscribed symbols arrive as `{"type":"price_update",...}`.
//!
//! The socket is deregistered when either direction ends, or by the hub
//! when a push to it fails.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use feed_core::wire::{ControlMessage, ControlResponse, ServerMessage};
use feed_hub::{ChannelSink, ConnectionId, StreamHub};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::control;
use super::AppState;

/// Build the WebSocket route
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// WebSocket upgrade handler
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut updates) = ChannelSink::channel(state.config.stream.outbound_buffer);
    let id = match state.hub.connect(Arc::new(sink)).await {
        Ok(id) => id,
        Err(error) => {
            warn!(%error, "rejecting websocket");
            return;
        }
    };
    let (mut sender, mut receiver) = socket.split();

    let hello = ServerMessage::Connected {
        connection_id: id.to_string(),
    };
    if let Err(error) = sender.send(Message::Text(hello.to_json().into())).await {
        warn!(connection_id = %id, %error, "failed to send connected message");
        state.hub.disconnect(id).await;
        return;
    }
    info!(connection_id = %id, "websocket connected");

    let (replies_tx, mut replies_rx) = mpsc::channel::<ControlResponse>(16);

    // Writer: price updates from the hub and replies to control frames.
    // Ends when the hub drops the sink or the reader goes away.
    let mut send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                update = updates.recv() => match update {
                    Some(update) => ServerMessage::PriceUpdate(update),
                    None => break,
                },
                reply = replies_rx.recv() => match reply {
                    Some(reply) => ServerMessage::ControlResult(reply),
                    None => break,
                },
            };
            if sender.send(Message::Text(message.to_json().into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let hub = state.hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            match frame {
                Message::Text(text) => {
                    let reply = handle_control(&hub, id, text.as_str()).await;
                    if replies_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.disconnect(id).await;
    info!(connection_id = %id, "websocket disconnected");
}

/// Decode and apply one control frame on behalf of the socket's connection.
async fn handle_control(hub: &StreamHub, id: ConnectionId, text: &str) -> ControlResponse {
    let message: ControlMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(error) => {
            debug!(connection_id = %id, %error, "undecodable control frame");
            return ControlResponse::failed(format!("invalid control message: {error}"));
        }
    };

    if let Some(raw) = message.connection_id.as_deref() {
        match control::parse_connection_id(raw) {
            Ok(named) if named == id => {}
            Ok(_) => {
                return ControlResponse::failed("connectionId does not match this socket");
            }
            Err(error) => return ControlResponse::failed(error.to_string()),
        }
    }

    match control::apply(hub, id, message.action, &message.symbols).await {
        Ok(response) => response,
        Err(error) => ControlResponse::failed(error.to_string()),
    }
}
