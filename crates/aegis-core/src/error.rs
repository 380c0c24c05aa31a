//! Error types for aegis-core
//!
//! This module provides the recovery error taxonomy and user-friendly error formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an invalid recovery policy (caught before any I/O)
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Offending field
        field: String,
        /// Detailed message
        message: String,
    },

    /// A phase was invoked from the wrong state
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A collaborator returned data that failed schema checks
    #[error("validation error: {0}")]
    Validation(String),

    /// An on-chain command template cannot be rendered deterministically
    #[error("template format error: {0}")]
    TemplateFormat(String),

    /// The relayer explicitly refused the request
    #[error("relayer rejected request: {0}")]
    RelayerRejected(String),

    /// Network or transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// On-chain operation not confirmed within the budget
    #[error("confirmation timeout for {operation} after {waited_ms}ms")]
    ConfirmationTimeout {
        /// Operation hash that is still pending
        operation: String,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// On-chain operation was included but reverted
    #[error("operation reverted: {0}")]
    Reverted(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`]
    #[must_use]
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether a later retry of the same call might succeed.
    ///
    /// Only transport failures qualify. A confirmation timeout is ambiguous
    /// and must be resolved by polling, not by resubmitting.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Stable short name of the error kind, used in logs and session snapshots
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidConfig { .. } => "invalid_config",
            Error::Precondition(_) => "precondition",
            Error::Validation(_) => "validation",
            Error::TemplateFormat(_) => "template_format",
            Error::RelayerRejected(_) => "relayer_rejected",
            Error::Transport(_) => "transport",
            Error::ConfirmationTimeout { .. } => "confirmation_timeout",
            Error::Reverted(_) => "reverted",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { field, message } => {
                format!("Recovery configuration error in '{}': {}", field, message)
            }
            Error::Precondition(msg) => format!("Phase cannot run yet: {}", msg),
            Error::Validation(msg) => format!("Unexpected response from a collaborator: {}", msg),
            Error::TemplateFormat(msg) => format!("Command template problem: {}", msg),
            Error::RelayerRejected(msg) => format!("The relayer refused the request: {}", msg),
            Error::Transport(msg) => format!("Network problem: {}", msg),
            Error::ConfirmationTimeout {
                operation,
                waited_ms,
            } => format!(
                "Operation {} was not confirmed within {} seconds.",
                operation,
                waited_ms / 1000
            ),
            Error::Reverted(msg) => format!("The on-chain operation reverted: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfig { field, .. } => Some(format!(
                "Check the '{}' setting in config/default.toml or the AEGIS_ environment.",
                field
            )),
            Error::Precondition(_) => {
                Some("Run `aegis status` to see which phase comes next.".to_string())
            }
            Error::Transport(_) => {
                Some("Check the RPC and relayer URLs, then rerun the same phase.".to_string())
            }
            Error::ConfirmationTimeout { .. } => Some(
                "Do not install again. Run `aegis confirm-install` to poll the pending operation."
                    .to_string(),
            ),
            Error::RelayerRejected(_) | Error::TemplateFormat(_) => Some(
                "Verify the template index and that the module templates match the relayer."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output.push('\n');
    output
}
