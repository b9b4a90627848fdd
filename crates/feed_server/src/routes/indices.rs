//! Index snapshot endpoints.

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use adapter_sources::CacheRead;
use feed_core::{IndexQuote, Provenance};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::AppState;

/// Index levels at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Exchange-local `HH:MM:SS`
    pub time: String,
    /// One quote per tracked index
    pub indices: Vec<IndexQuote>,
    /// Source of the quotes
    pub provenance: Provenance,
    /// Served from cache without an upstream fetch
    pub cached: bool,
}

/// Build the index routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/indices", get(snapshot_handler))
        .route("/api/indices/refresh", post(refresh_handler))
        .route("/api/indices/stream", get(stream_handler))
}

fn snapshot(state: &AppState, read: CacheRead<Vec<IndexQuote>>) -> IndexSnapshot {
    let now = state.now();
    IndexSnapshot {
        timestamp: now.timestamp_millis(),
        time: state.clock.time_label(now),
        indices: read.value.as_ref().clone(),
        provenance: read.provenance,
        cached: read.cached,
    }
}

/// GET /api/indices
async fn snapshot_handler(State(state): State<AppState>) -> Json<IndexSnapshot> {
    let read = state.indices.snapshot().await;
    Json(snapshot(&state, read))
}

/// POST /api/indices/refresh - bypass the cache once
async fn refresh_handler(State(state): State<AppState>) -> Json<IndexSnapshot> {
    let read = state.indices.refresh().await;
    Json(snapshot(&state, read))
}

/// GET /api/indices/stream - server-sent snapshots.
///
/// Every `snapshot_interval` the stream emits a `data:` event while the
/// exchange is trading and a `: heartbeat` comment otherwise. It ends when
/// the server shuts down.
async fn stream_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut ticker = tokio::time::interval(state.config.sources.snapshot_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = state.shutdown_signal();
    debug!("snapshot stream opened");

    let events = stream::unfold(
        (state, ticker, shutdown),
        |(state, mut ticker, mut shutdown)| async move {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stopping| *stopping) => return None,
            }
            let event = snapshot_event(&state).await;
            Some((Ok(event), (state, ticker, shutdown)))
        },
    );
    Sse::new(events)
}

async fn snapshot_event(state: &AppState) -> Event {
    if !state.clock.is_trading_time(state.now()) {
        return Event::default().comment("heartbeat");
    }
    let read = state.indices.snapshot().await;
    match Event::default().json_data(snapshot(state, read)) {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, "failed to encode index snapshot");
            Event::default().comment("heartbeat")
        }
    }
}
