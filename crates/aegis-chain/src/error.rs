//! Error types for aegis-chain

use thiserror::Error;

/// JSON-RPC error code nodes use for reverted calls
pub const EXECUTION_REVERTED: i64 = 3;

/// Node does not expose the method (e.g. signing disabled)
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Node refused the parameters (e.g. unknown or locked sender)
pub const INVALID_PARAMS: i64 = -32602;

/// Chain client error type
#[derive(Debug, Error)]
pub enum Error {
    /// Client not configured
    #[error("chain client not configured: {0}")]
    NotConfigured(String),

    /// Node answered with a JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message
        message: String,
    },

    /// HTTP or connection failure
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Response envelope or result did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// ABI decoding of a call result failed
    #[error("abi decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Whether the node reported an execution revert
    #[must_use]
    pub fn is_revert(&self) -> bool {
        match self {
            Error::Rpc { code, message } => {
                *code == EXECUTION_REVERTED || message.to_lowercase().contains("revert")
            }
            _ => false,
        }
    }

    /// Whether retrying cannot help because the node rejects the request itself
    #[must_use]
    pub fn is_node_config(&self) -> bool {
        matches!(
            self,
            Error::Rpc { code, .. } if *code == METHOD_NOT_FOUND || *code == INVALID_PARAMS
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for aegis_core::Error {
    fn from(error: Error) -> Self {
        if error.is_revert() {
            return aegis_core::Error::Reverted(error.to_string());
        }
        if error.is_node_config() {
            return aegis_core::Error::invalid_config("chain", error.to_string());
        }
        match error {
            Error::NotConfigured(msg) => aegis_core::Error::invalid_config("chain", msg),
            Error::Rpc { .. } | Error::Network(_) | Error::Timeout(_) => {
                aegis_core::Error::Transport(error.to_string())
            }
            Error::InvalidResponse(msg) | Error::Decode(msg) => aegis_core::Error::Validation(msg),
        }
    }
}
