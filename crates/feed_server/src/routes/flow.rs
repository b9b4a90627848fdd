//! Institutional (FII/DII) flow endpoints.

use adapter_sources::flow::parse_date;
use adapter_sources::FlowReport;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use feed_core::{FlowDay, Provenance};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

const DEFAULT_PERIOD: &str = "1W";

#[derive(Debug, Deserialize)]
pub struct FlowQuery {
    period: Option<String>,
}

/// Body of `POST /api/flow`
#[derive(Debug, Deserialize)]
pub struct FlowCommand {
    action: String,
    /// `YYYY-MM-DD`; every cached date when absent
    date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FlowDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Build the flow routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flow", get(flow_handler).post(refresh_handler))
}

/// GET /api/flow?period=1W
async fn flow_handler(
    State(state): State<AppState>,
    query: Result<Query<FlowQuery>, QueryRejection>,
) -> Result<Json<FlowReport>, ApiError> {
    let Query(query) = query?;
    let period = query.period.as_deref().unwrap_or(DEFAULT_PERIOD);
    let today = state.clock.local_date(state.now());
    let report = state.flow.flow(period, today).await?;
    Ok(Json(report))
}

/// POST /api/flow `{"action":"refresh","date":"2024-06-14"}`
async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<FlowCommand>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(command) = body?;
    if command.action != "refresh" {
        return Err(ApiError::Validation(format!(
            "unsupported action '{}'",
            command.action
        )));
    }

    let response = match command.date.as_deref() {
        Some(raw) => {
            let date = parse_date(raw)?;
            let today = state.clock.local_date(state.now());
            let read = state.flow.refresh_date(date, today).await?;
            RefreshResponse {
                success: true,
                message: format!("refreshed {date}"),
                provenance: Some(read.provenance),
                data: Some(read.value.as_ref().clone()),
            }
        }
        None => {
            let dropped = state.flow.refresh_all().await;
            RefreshResponse {
                success: true,
                message: format!("cleared {dropped} cached day(s)"),
                data: None,
                provenance: None,
            }
        }
    };
    Ok(Json(response))
}
