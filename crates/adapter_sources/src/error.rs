//! Error types for upstream access and caller requests.

use thiserror::Error;

/// Upstream failure. Recovered by the provider chain; never returned to
/// callers of the services.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport level failure, including timeouts
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the upstream
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body could not be decoded
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),

    /// Provider is not able to serve the request
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Malformed or unsatisfiable caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Unknown flow period token
    #[error("invalid period '{0}', expected one of 1D, 1W, 2W, 1M, 3M")]
    InvalidPeriod(String),

    /// Date could not be parsed
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Date is not a trading day that can have data
    #[error("no trading data for {0}")]
    NotFound(String),
}

impl RequestError {
    /// True for errors that map to "not found" rather than "bad request"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
