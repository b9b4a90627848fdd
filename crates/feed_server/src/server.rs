//! Server startup and shutdown
//!
//! Binds the router to the configured host/port and shuts down on Ctrl-C:
//! the listener stops accepting, open streams are closed through
//! [`AppState::begin_shutdown`], and in-flight requests get
//! `shutdown_timeout_secs` to finish.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::routes::{self, AppState};

/// Router plus state, ready to bind.
pub struct Server {
    config: Arc<ServerConfig>,
    state: AppState,
    router: Router,
}

impl Server {
    /// Validate `config` and build every service it describes.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let config = Arc::new(config);
        let state = AppState::new(config.clone())?;
        Ok(Self::with_state(state))
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        let router = routes::build_router(state.clone());
        Self {
            config: state.config.clone(),
            state,
            router,
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared application state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind to the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<(), StartupError> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.run_with_listener(listener).await?;
        Ok(())
    }

    /// Serve on an existing listener until Ctrl-C.
    ///
    /// Binding to port 0 gives tests a random free port.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, ctrl_c()).await
    }

    /// Serve on `listener` until `signal` completes, then shut down.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(%addr, "server listening");

        let state = self.state.clone();
        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
        let shutdown = async move {
            signal.await;
            info!("shutdown signal received");
            let closed = state.begin_shutdown().await;
            info!(connections = closed, "stream connections closed");
            let _ = signalled_tx.send(());
        };

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => return result,
            Ok(()) = signalled_rx => {}
        }

        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        match tokio::time::timeout(grace, serve).await {
            Ok(result) => {
                info!("server stopped");
                result
            }
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "connections still open after grace period, stopping anyway"
                );
                Ok(())
            }
        }
    }
}

async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
