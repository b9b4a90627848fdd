//! HTTP, WebSocket and SSE server for the tickstream feed
//!
//! This crate exposes the stream hub over a WebSocket at `/ws`, a control
//! endpoint for subscriptions, and the cached index, bars and flow
//! endpoints backed by `adapter_sources`.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::{build_config, CliArgs, ServerConfig};
pub use error::{ApiError, StartupError};
pub use routes::{build_router, AppState};
pub use server::Server;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
