//! Error types and their HTTP mapping.

use adapter_sources::{RequestError, SourceError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feed_core::wire::ControlResponse;
use feed_core::CoreError;
use feed_hub::HubError;
use thiserror::Error;

use crate::config::ConfigError;

/// Request-level failure, rendered as `{"success": false, "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed caller input (400)
    #[error("{0}")]
    Validation(String),

    /// Unknown connection or a refresh target with no data (404)
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(ControlResponse::failed(self.to_string()))).into_response()
    }
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        match e {
            HubError::NotFound(_) => Self::NotFound(e.to_string()),
            e if e.is_validation() => Self::Validation(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        if e.is_not_found() {
            Self::NotFound(e.to_string())
        } else {
            Self::Validation(e.to_string())
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

/// Failure while assembling or running the server.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build stream hub: {0}")]
    Hub(#[from] HubError),

    #[error("invalid model parameters: {0}")]
    Model(#[from] CoreError),

    #[error("failed to build upstream client: {0}")]
    Source(#[from] SourceError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
