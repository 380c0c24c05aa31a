//! Error types for aegis-relayer

use thiserror::Error;

/// Relayer client error type
#[derive(Debug, Error)]
pub enum Error {
    /// Client not configured
    #[error("relayer not configured: {0}")]
    NotConfigured(String),

    /// Relayer refused the request (4xx)
    #[error("relayer rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Sanitized response body
        message: String,
    },

    /// Relayer failed internally (5xx) or asked to retry later (408, 429)
    #[error("relayer server error ({status}): {message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Sanitized response body
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Response body is not JSON
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for aegis_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::NotConfigured(msg) => aegis_core::Error::invalid_config("relayer", msg),
            Error::Rejected { .. } => aegis_core::Error::RelayerRejected(error.to_string()),
            Error::Server { .. } | Error::Network(_) | Error::Timeout(_) => {
                aegis_core::Error::Transport(error.to_string())
            }
            Error::InvalidResponse(msg) => aegis_core::Error::Validation(msg),
        }
    }
}
