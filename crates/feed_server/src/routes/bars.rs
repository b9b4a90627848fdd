//! Synthetic daily bars.
//!
//! `GET /api/bars?symbol=TCS&days=5&end=2024-06-14&order=desc`

use adapter_sources::flow::parse_date;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Datelike;
use feed_core::{normalize_symbol, symbol_hash, Bar, Provenance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::AppState;
use crate::error::ApiError;

/// Order of the returned bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarOrder {
    /// Oldest first
    #[default]
    Asc,
    /// Most recent first
    Desc,
}

impl FromStr for BarOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(BarOrder::Asc),
            "desc" => Ok(BarOrder::Desc),
            other => Err(ApiError::Validation(format!(
                "invalid order '{other}', expected asc or desc"
            ))),
        }
    }
}

/// Earliest accepted year for `end`.
const EARLIEST_END_YEAR: i32 = 1970;

/// Query string of `GET /api/bars`; every field is optional on the wire.
#[derive(Debug, Deserialize)]
pub struct BarsQuery {
    symbol: Option<String>,
    days: Option<usize>,
    end: Option<String>,
    order: Option<String>,
}

/// Bars for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarsResponse {
    /// Normalised symbol
    pub symbol: String,
    /// Order of `bars`
    pub order: BarOrder,
    /// Always `fallback-sample`
    pub provenance: Provenance,
    /// Weekday bars, one per session
    pub bars: Vec<Bar>,
}

/// Build the bars route
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bars", get(bars_handler))
}

/// GET /api/bars
async fn bars_handler(
    State(state): State<AppState>,
    query: Result<Query<BarsQuery>, QueryRejection>,
) -> Result<Json<BarsResponse>, ApiError> {
    let Query(query) = query?;
    let raw_symbol = query
        .symbol
        .ok_or_else(|| ApiError::Validation("symbol is required".to_string()))?;
    let symbol = normalize_symbol(&raw_symbol)?;

    let limits = &state.config.bars;
    let days = query.days.unwrap_or(limits.default_days);
    if !(1..=limits.max_days).contains(&days) {
        return Err(ApiError::Validation(format!(
            "days must lie in 1..={}",
            limits.max_days
        )));
    }
    let end = match query.end.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => state.clock.local_date(state.now()),
    };
    if end.year() < EARLIEST_END_YEAR {
        return Err(ApiError::Validation(format!(
            "end must fall in {EARLIEST_END_YEAR} or later"
        )));
    }
    let order = match query.order.as_deref() {
        Some(raw) => raw.parse()?,
        None => BarOrder::default(),
    };

    let mut rng = match state.config.synthesis.seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ symbol_hash(&symbol)),
        None => StdRng::from_entropy(),
    };
    let base = state.hub.directory().base_price(&symbol);
    let mut bars = state.bars.generate(base, end, days, &mut rng);
    if order == BarOrder::Desc {
        bars.reverse();
    }

    Ok(Json(BarsResponse {
        symbol,
        order,
        provenance: Provenance::FallbackSample,
        bars,
    }))
}
