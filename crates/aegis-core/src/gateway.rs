//! Collaborator traits
//!
//! The orchestrator talks to the chain and the relayer only through these
//! traits. Concrete clients live in `aegis-chain` and `aegis-relayer`; tests
//! use [`crate::mock`].
//!
//! Relayer methods return the raw JSON body. Decoding into typed values
//! happens in [`crate::schema`] so that no untyped payload crosses into the
//! state machine.

use crate::error::Result;
use crate::template::TemplateSet;
use crate::types::{GuardianSalt, ModuleType, OperationHash, Receipt};
use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

// ============================================================================
// Relayer request bodies
// ============================================================================

/// Body of `POST /getAccountSalt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSaltRequest {
    /// Account code, 64 hex digits without prefix
    pub account_code: String,
    /// Guardian email
    pub email_addr: String,
}

/// Body of `POST /acceptanceRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceRequest {
    /// Recovery module address
    pub controller_eth_addr: Address,
    /// Guardian email
    pub guardian_email_addr: String,
    /// Account code, 64 hex digits without prefix
    pub account_code: String,
    /// Index of the template the command was rendered from
    pub template_idx: u64,
    /// Rendered command
    pub command: String,
}

/// Body of `POST /recoveryRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRequestBody {
    /// Recovery module address
    pub controller_eth_addr: Address,
    /// Guardian email
    pub guardian_email_addr: String,
    /// Index of the template the command was rendered from
    pub template_idx: u64,
    /// Rendered command
    pub command: String,
}

/// Body of `POST /completeRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Recovery module address
    pub controller_eth_addr: Address,
    /// Wallet being recovered
    pub account_eth_addr: Address,
    /// `abi.encode(wallet, recoveryCalldata)`
    pub complete_calldata: Bytes,
}

// ============================================================================
// Traits
// ============================================================================

/// Authenticated client for the attestation relayer
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RelayerGateway: Send + Sync {
    /// Derive the salt for an (account code, guardian) pair
    async fn get_account_salt(&self, request: AccountSaltRequest) -> Result<serde_json::Value>;

    /// Enqueue a guardian acceptance
    async fn acceptance_request(&self, request: AcceptanceRequest) -> Result<serde_json::Value>;

    /// Enqueue a recovery request
    async fn recovery_request(&self, request: RecoveryRequestBody) -> Result<serde_json::Value>;

    /// Ask the relayer to execute the recovery call once the delay has passed
    async fn complete_request(&self, request: CompleteRequest) -> Result<serde_json::Value>;
}

/// Read/write access to the recovery module and the wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChainGateway: Send + Sync {
    /// `computeEmailAuthAddress(wallet, salt)` on the module
    async fn compute_email_auth_address(
        &self,
        module: Address,
        wallet: Address,
        salt: GuardianSalt,
    ) -> Result<Address>;

    /// `acceptanceCommandTemplates()` on the module
    async fn acceptance_command_templates(&self, module: Address) -> Result<TemplateSet>;

    /// `recoveryCommandTemplates()` on the module
    async fn recovery_command_templates(&self, module: Address) -> Result<TemplateSet>;

    /// Install a module on the wallet
    async fn install_module(
        &self,
        wallet: Address,
        module_type: ModuleType,
        module: Address,
        init_data: Bytes,
    ) -> Result<OperationHash>;

    /// Block until the operation is included. Callers bound this with a timeout.
    async fn wait_for_receipt(&self, operation: OperationHash) -> Result<Receipt>;
}
