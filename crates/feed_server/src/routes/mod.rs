//! HTTP surface of the feed.
//!
//! | Module | Paths |
//! |---|---|
//! | `health` | `/health`, `/ready` |
//! | `ws` | `/ws` price stream |
//! | `control` | `/api/stream/control` |
//! | `indices` | `/api/indices`, `/api/indices/refresh`, `/api/indices/stream` |
//! | `bars` | `/api/bars` |
//! | `flow` | `/api/flow` |

pub mod bars;
pub mod control;
pub mod flow;
pub mod health;
pub mod indices;
pub mod ws;

use adapter_sources::{
    http_chain, http_client, Fallback, FlowService, IndexSnapshotService, SyntheticFlow,
    SyntheticIndices,
};
use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use feed_core::{BarGenerator, ExchangeClock, FlowDay, IndexQuote, SymbolDirectory};
use feed_hub::StreamHub;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::StartupError;

/// Services and settings every handler sees. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Reference point for `uptimeSecs`
    pub start_time: std::time::Instant,
    /// Connection registry and broadcast scheduler
    pub hub: StreamHub,
    pub indices: Arc<IndexSnapshotService>,
    pub flow: Arc<FlowService>,
    pub bars: Arc<BarGenerator>,
    /// Exchange trading window
    pub clock: ExchangeClock,
    wall_clock: fn() -> DateTime<Utc>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Build the services described by `config`.
    pub fn new(config: Arc<ServerConfig>) -> Result<Self, StartupError> {
        config.validate()?;
        let directory = SymbolDirectory::default();
        let hub = StreamHub::new(
            config.stream.hub_config(),
            config.synthesis.model.clone(),
            directory.clone(),
            config.synthesis.seed,
        )?;

        let sources = &config.sources;
        let client = http_client(sources.request_timeout())?;
        let index_fallback: Arc<dyn Fallback<(), Vec<IndexQuote>>> = Arc::new(
            SyntheticIndices::new(&directory, sources.fallback_index_sigma),
        );
        let index_chain = http_chain(
            sources.indices_primary_url.as_deref(),
            sources.indices_mirror_url.as_deref(),
            &client,
            index_fallback,
        );
        let flow_fallback: Arc<dyn Fallback<NaiveDate, FlowDay>> = Arc::new(SyntheticFlow {
            fii: sources.fallback_fii,
            dii: sources.fallback_dii,
        });
        let flow_chain = http_chain(
            sources.flow_primary_url.as_deref(),
            sources.flow_mirror_url.as_deref(),
            &client,
            flow_fallback,
        );

        let bars = BarGenerator::new(config.bars.daily_volatility, config.synthesis.model.clone())?;

        Ok(Self {
            start_time: std::time::Instant::now(),
            hub,
            indices: Arc::new(IndexSnapshotService::new(index_chain, sources.cache_ttl())),
            flow: Arc::new(FlowService::new(flow_chain, sources.cache_ttl())),
            bars: Arc::new(bars),
            clock: ExchangeClock::default(),
            wall_clock: Utc::now,
            shutdown: Arc::new(watch::channel(false).0),
            config,
        })
    }

    /// Replace the source of wall-clock time.
    pub fn with_wall_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.wall_clock = now;
        self
    }

    /// Current wall-clock time
    pub fn now(&self) -> DateTime<Utc> {
        (self.wall_clock)()
    }

    /// Receiver that flips to `true` once shutdown begins
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Whether [`AppState::begin_shutdown`] has run
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// End long-lived streams and close every stream connection.
    /// Returns the number of connections closed.
    pub async fn begin_shutdown(&self) -> usize {
        self.shutdown.send_replace(true);
        self.hub.shutdown().await
    }
}

/// All routes with request tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(ws::routes())
        .merge(control::routes())
        .merge(indices::routes())
        .merge(bars::routes())
        .merge(flow::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
