//! Error types for the core layer.

use thiserror::Error;

/// Errors raised while validating symbols or model parameters.
///
/// # Examples
/// ```
/// use feed_core::CoreError;
///
/// let err = CoreError::InvalidSymbol("$$$".to_string());
/// assert_eq!(err.to_string(), "Invalid symbol: $$$");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Symbol is empty, too long, or contains unsupported characters
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A model parameter is out of range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Human readable reason
        reason: String,
    },
}

impl CoreError {
    /// Create an invalid parameter error
    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_display() {
        let err = CoreError::parameter("volatility", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter volatility: must be positive"
        );
    }
}
