//! Orchestrator configuration

use alloy_primitives::Address;
use std::time::Duration;

/// Default time to wait for an install to be confirmed
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-module settings shared by every wallet the orchestrator drives
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Recovery module address (the relayer's "controller")
    pub controller: Address,
    /// Template index used for both acceptance and recovery commands
    pub template_idx: u64,
    /// Budget for install confirmation
    pub confirmation_timeout: Duration,
}

impl OrchestratorConfig {
    /// Create a configuration for a recovery module
    #[must_use]
    pub fn new(controller: Address) -> Self {
        Self {
            controller,
            template_idx: 0,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Set the template index
    #[must_use]
    pub fn with_template_idx(mut self, idx: u64) -> Self {
        self.template_idx = idx;
        self
    }

    /// Set the confirmation timeout
    #[must_use]
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}
