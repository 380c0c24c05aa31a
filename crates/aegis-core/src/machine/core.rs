//! Orchestrator core structure
//!
//! Contains the `RecoveryOrchestrator` struct, its constructors and the
//! bookkeeping shared by every phase.

use crate::error::{Error, Result};
use crate::gateway::{ChainGateway, RelayerGateway};
use crate::types::{AccountCode, GuardianIdentity};
use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{info, warn};

use super::config::OrchestratorConfig;
use super::phase::{Phase, PhaseFailure, RecoverySession};

/// Drives one wallet through install, accept, request and complete.
///
/// Each phase takes `&mut self`, so at most one call per wallet is in
/// flight. Independent wallets use independent orchestrators that may share
/// the gateway handles.
pub struct RecoveryOrchestrator {
    pub(crate) chain: Arc<dyn ChainGateway>,
    pub(crate) relayer: Arc<dyn RelayerGateway>,
    pub(crate) config: OrchestratorConfig,
    pub(crate) account_code: AccountCode,
    pub(crate) session: RecoverySession,
}

impl RecoveryOrchestrator {
    /// Start a new recovery flow for `wallet`
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainGateway>,
        relayer: Arc<dyn RelayerGateway>,
        config: OrchestratorConfig,
        account_code: AccountCode,
        wallet: Address,
        guardian: GuardianIdentity,
    ) -> Self {
        Self::resume(
            chain,
            relayer,
            config,
            account_code,
            RecoverySession::new(wallet, guardian),
        )
    }

    /// Continue from a previously saved session
    #[must_use]
    pub fn resume(
        chain: Arc<dyn ChainGateway>,
        relayer: Arc<dyn RelayerGateway>,
        config: OrchestratorConfig,
        account_code: AccountCode,
        session: RecoverySession,
    ) -> Self {
        Self {
            chain,
            relayer,
            config,
            account_code,
            session,
        }
    }

    /// Current session snapshot
    #[must_use]
    pub fn session(&self) -> &RecoverySession {
        &self.session
    }

    /// Consume the orchestrator, keeping the snapshot
    #[must_use]
    pub fn into_session(self) -> RecoverySession {
        self.session
    }

    /// Last reached phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// Wallet this orchestrator drives
    #[must_use]
    pub fn wallet(&self) -> Address {
        self.session.wallet
    }

    /// Module configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub(crate) fn ensure_phase(&self, expected: Phase, action: &str) -> Result<()> {
        if self.session.phase != expected {
            return Err(Error::Precondition(format!(
                "{} requires phase {}, wallet {} is at {}",
                action, expected, self.session.wallet, self.session.phase
            )));
        }
        Ok(())
    }

    /// Record the outcome of a phase attempt without advancing.
    pub(crate) fn record<T>(&mut self, attempted: Phase, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => Ok(value),
            Err(error) => {
                warn!(
                    wallet = %self.session.wallet,
                    phase = %self.session.phase,
                    attempted = %attempted,
                    kind = error.kind(),
                    "phase failed: {}",
                    error
                );
                self.session.last_failure = Some(PhaseFailure::from_error(attempted, &error));
                self.session.touch();
                Err(error)
            }
        }
    }

    pub(crate) fn advance(&mut self, to: Phase) {
        debug_assert_eq!(self.session.phase.next(), Some(to));
        info!(
            wallet = %self.session.wallet,
            from = %self.session.phase,
            to = %to,
            "recovery phase advanced"
        );
        self.session.phase = to;
        self.session.last_failure = None;
        self.session.touch();
    }
}
