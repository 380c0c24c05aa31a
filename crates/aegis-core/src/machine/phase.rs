//! Recovery phases and the persisted session snapshot

use crate::calldata::OwnerSwap;
use crate::error::Error;
use crate::schema::CompletionAck;
use crate::types::{GuardianIdentity, OperationHash, Receipt, RequestId};
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol phase reached by a wallet. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing submitted yet
    Uninitialized,
    /// Recovery module installed and confirmed on-chain
    ModuleInstalled,
    /// Guardian acceptance enqueued at the relayer
    GuardianAccepted,
    /// Recovery request enqueued at the relayer
    RecoveryRequested,
    /// Completion submitted to the relayer
    RecoveryCompleted,
}

impl Phase {
    /// The phase a successful step from here leads to
    #[must_use]
    pub fn next(&self) -> Option<Phase> {
        match self {
            Self::Uninitialized => Some(Self::ModuleInstalled),
            Self::ModuleInstalled => Some(Self::GuardianAccepted),
            Self::GuardianAccepted => Some(Self::RecoveryRequested),
            Self::RecoveryRequested => Some(Self::RecoveryCompleted),
            Self::RecoveryCompleted => None,
        }
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::ModuleInstalled => "module_installed",
            Self::GuardianAccepted => "guardian_accepted",
            Self::RecoveryRequested => "recovery_requested",
            Self::RecoveryCompleted => "recovery_completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the last phase attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFailure {
    /// Phase the attempt was trying to reach
    pub attempted: Phase,
    /// Error kind (see [`Error::kind`])
    pub kind: String,
    /// Error message
    pub message: String,
    /// Whether rerunning the same phase may succeed
    pub transient: bool,
    /// When it failed
    pub at: DateTime<Utc>,
}

impl PhaseFailure {
    pub(crate) fn from_error(attempted: Phase, error: &Error) -> Self {
        Self {
            attempted,
            kind: error.kind().to_string(),
            message: error.to_string(),
            transient: error.is_transient(),
            at: Utc::now(),
        }
    }
}

/// Serializable state of one recovery attempt.
///
/// A failed phase leaves `phase` at the last reached state and records
/// `last_failure`; the next successful phase clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySession {
    /// Wallet being protected/recovered
    pub wallet: Address,
    /// Guardian driving acceptance and recovery
    pub guardian: GuardianIdentity,
    /// Last reached phase
    pub phase: Phase,
    /// Install operation submitted but not yet confirmed
    pub pending_install: Option<OperationHash>,
    /// Receipt of the confirmed install
    pub install_receipt: Option<Receipt>,
    /// Relayer id of the acceptance request
    pub acceptance_request_id: Option<RequestId>,
    /// Relayer id of the recovery request
    pub recovery_request_id: Option<RequestId>,
    /// Owner swap submitted for completion
    pub owner_swap: Option<OwnerSwap>,
    /// Relayer acknowledgement of the completion
    pub completion: Option<CompletionAck>,
    /// Most recent failure, if the last attempt failed
    pub last_failure: Option<PhaseFailure>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl RecoverySession {
    /// Fresh session in [`Phase::Uninitialized`]
    #[must_use]
    pub fn new(wallet: Address, guardian: GuardianIdentity) -> Self {
        Self {
            wallet,
            guardian,
            phase: Phase::Uninitialized,
            pending_install: None,
            install_receipt: None,
            acceptance_request_id: None,
            recovery_request_id: None,
            owner_swap: None,
            completion: None,
            last_failure: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether the last phase attempt failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.last_failure.is_some()
    }

    /// Whether the whole protocol has run
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::RecoveryCompleted
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = Phase::Uninitialized;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            phase = next;
            seen.push(phase);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(phase, Phase::RecoveryCompleted);
    }

    #[test]
    fn test_phase_serde() {
        assert_eq!(
            serde_json::to_string(&Phase::GuardianAccepted).unwrap(),
            "\"guardian_accepted\""
        );
    }

    #[test]
    fn test_session_snapshot_round_trip() {
        let mut session = RecoverySession::new(
            Address::repeat_byte(1),
            GuardianIdentity::new("g@example.org").unwrap(),
        );
        session.phase = Phase::ModuleInstalled;
        session.last_failure = Some(PhaseFailure::from_error(
            Phase::GuardianAccepted,
            &Error::Transport("connection refused".to_string()),
        ));

        let json = serde_json::to_string(&session).unwrap();
        let restored: RecoverySession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
        assert!(restored.is_failed());
        assert!(restored.last_failure.unwrap().transient);
    }
}
