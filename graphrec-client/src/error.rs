//! Gateway error types
//!
//! Every remote failure falls into one of three kinds: the request never
//! completed, the service answered with a non-success status, or the body
//! could not be parsed.

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service returned a non-success status
    #[error("API error {0}: {1}")]
    Status(u16, String),

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request rejected locally before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Short machine-readable label for logs and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Network(_) => "network",
            GatewayError::Status(..) => "status",
            GatewayError::Parse(_) => "parse",
            GatewayError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Errors raised while assembling a client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration or storage failure
    #[error(transparent)]
    Common(#[from] graphrec_common::Error),

    /// HTTP client could not be built
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
