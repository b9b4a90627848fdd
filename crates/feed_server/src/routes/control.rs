//! Subscription control over HTTP.
//!
//! The same request shape is accepted as a text frame on the WebSocket,
//! where `connectionId` may be omitted.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use feed_core::wire::{ControlAction, ControlMessage, ControlResponse};
use feed_hub::{ConnectionId, HubError, StreamHub};

use super::AppState;
use crate::error::ApiError;

/// Build the control routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stream/control", post(control_handler))
}

/// POST /api/stream/control
async fn control_handler(
    State(state): State<AppState>,
    body: Result<Json<ControlMessage>, JsonRejection>,
) -> Result<Json<ControlResponse>, ApiError> {
    let Json(message) = body?;
    let raw_id = message
        .connection_id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("connectionId is required".to_string()))?;
    let id = parse_connection_id(raw_id)?;

    let response = apply(&state.hub, id, message.action, &message.symbols).await?;
    Ok(Json(response))
}

pub(crate) fn parse_connection_id(raw: &str) -> Result<ConnectionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("invalid connectionId '{raw}'")))
}

/// Apply one control verb to a connection.
pub(crate) async fn apply(
    hub: &StreamHub,
    id: ConnectionId,
    action: ControlAction,
    symbols: &[String],
) -> Result<ControlResponse, HubError> {
    let verb = match action {
        ControlAction::Subscribe => {
            hub.subscribe(id, symbols).await?;
            "subscribed to"
        }
        ControlAction::Unsubscribe => {
            hub.unsubscribe(id, symbols).await?;
            "unsubscribed from"
        }
    };
    let active = hub
        .subscriptions(id)
        .await
        .ok_or(HubError::NotFound(id))?;
    Ok(ControlResponse::ok(format!(
        "{verb} {} symbol(s); {} active",
        symbols.len(),
        active.len()
    )))
}
