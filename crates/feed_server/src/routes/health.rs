//! Liveness and readiness probes.
//!
//! `/health` always answers 200 with the hub counters; `/ready` turns 503
//! as soon as shutdown begins so balancers stop routing new streams here.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use feed_hub::HubStats;
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    ShuttingDown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_secs: u64,
    pub stream: HubStats,
    /// Exchange is inside its trading window right now
    pub market_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.is_shutting_down() {
        ServiceStatus::ShuttingDown
    } else {
        ServiceStatus::Healthy
    };
    Json(HealthResponse {
        status,
        version: crate::VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        stream: state.hub.stats().await,
        market_open: state.clock.is_trading_time(state.now()),
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.is_shutting_down() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse { ready: false }),
        )
    } else {
        (StatusCode::OK, Json(ReadyResponse { ready: true }))
    }
}
