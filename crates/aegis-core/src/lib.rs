//! Aegis Core - guardian-based social recovery
//!
//! This crate provides the recovery protocol for email-guarded smart wallets:
//! - Commitment: account codes, guardian salts and on-chain commitments
//! - Module config: validated guardian policy encoded as module `initData`
//! - Template: exact rendering of on-chain command templates
//! - Machine: the install → accept → request → complete state machine
//! - Gateway: traits for the chain and relayer collaborators
//! - Mock: in-memory gateways for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calldata;
pub mod commitment;
pub mod error;
pub mod gateway;
pub mod machine;
pub mod mock;
pub mod module_config;
pub mod schema;
pub mod template;
pub mod types;

pub use calldata::{OwnerSwap, SWAP_OWNER_SELECTOR};
pub use commitment::{generate_account_code, CommitmentGenerator};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use gateway::{
    AcceptanceRequest, AccountSaltRequest, ChainGateway, CompleteRequest, RecoveryRequestBody,
    RelayerGateway,
};
pub use machine::{
    OrchestratorConfig, Phase, PhaseFailure, RecoveryOrchestrator, RecoverySession,
    DEFAULT_CONFIRMATION_TIMEOUT,
};
pub use module_config::{
    build_install_payload, decode_install_payload, encode_config, EncodedConfig, RecoveryConfig,
    DEFAULT_EXPIRY_SECS,
};
pub use schema::CompletionAck;
pub use template::{
    fetch_acceptance_templates, fetch_recovery_templates, render_command, CommandTemplate,
    Substitutions, TemplateSet,
};
pub use types::{
    AccountCode, GuardianCommitment, GuardianIdentity, GuardianSalt, ModuleType, OperationHash,
    Receipt, RequestId,
};
