//! In-memory gateways for testing
//!
//! `MockRelayer` answers every endpoint with well-formed responses unless a
//! response has been queued, and simulates execution of completed
//! recoveries. `MockChain` serves fixed templates, derives commitments by
//! hashing and confirms installs according to a [`ReceiptMode`].

use crate::calldata::OwnerSwap;
use crate::error::{Error, Result};
use crate::gateway::{
    AcceptanceRequest, AccountSaltRequest, ChainGateway, CompleteRequest, RecoveryRequestBody,
    RelayerGateway,
};
use crate::template::{CommandTemplate, TemplateSet};
use crate::types::{GuardianSalt, ModuleType, OperationHash, Receipt};
use alloy_primitives::{keccak256, Address, Bytes};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ============================================================================
// Relayer
// ============================================================================

/// Relayer endpoints, used to queue responses and read call counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayerEndpoint {
    /// `/getAccountSalt`
    AccountSalt,
    /// `/acceptanceRequest`
    Acceptance,
    /// `/recoveryRequest`
    Recovery,
    /// `/completeRequest`
    Complete,
}

impl RelayerEndpoint {
    fn slot(self) -> usize {
        match self {
            Self::AccountSalt => 0,
            Self::Acceptance => 1,
            Self::Recovery => 2,
            Self::Complete => 3,
        }
    }
}

/// A relayer that accepts any well-formed request.
#[derive(Default)]
pub struct MockRelayer {
    calls: [AtomicUsize; 4],
    next_id: AtomicU64,
    queued: Mutex<[VecDeque<Result<Value>>; 4]>,
    acceptances: Mutex<Vec<AcceptanceRequest>>,
    recoveries: Mutex<Vec<RecoveryRequestBody>>,
    executed: Mutex<Vec<(Address, OwnerSwap)>>,
}

impl MockRelayer {
    /// Create a new mock relayer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response for an endpoint, overriding the default.
    pub fn queue(&self, endpoint: RelayerEndpoint, response: Result<Value>) {
        lock(&self.queued)[endpoint.slot()].push_back(response);
    }

    /// Number of calls made to an endpoint
    #[must_use]
    pub fn calls(&self, endpoint: RelayerEndpoint) -> usize {
        self.calls[endpoint.slot()].load(Ordering::SeqCst)
    }

    /// Calls across all endpoints
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Acceptance requests received
    #[must_use]
    pub fn acceptances(&self) -> Vec<AcceptanceRequest> {
        lock(&self.acceptances).clone()
    }

    /// Recovery requests received
    #[must_use]
    pub fn recoveries(&self) -> Vec<RecoveryRequestBody> {
        lock(&self.recoveries).clone()
    }

    /// Owner swaps executed on behalf of completed recoveries
    #[must_use]
    pub fn executed_swaps(&self) -> Vec<(Address, OwnerSwap)> {
        lock(&self.executed).clone()
    }

    fn enter(&self, endpoint: RelayerEndpoint) -> Option<Result<Value>> {
        self.calls[endpoint.slot()].fetch_add(1, Ordering::SeqCst);
        lock(&self.queued)[endpoint.slot()].pop_front()
    }

    fn request_id(&self) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        json!({ "requestId": format!("req-{}", id) })
    }
}

#[async_trait::async_trait]
impl RelayerGateway for MockRelayer {
    async fn get_account_salt(&self, request: AccountSaltRequest) -> Result<Value> {
        if let Some(queued) = self.enter(RelayerEndpoint::AccountSalt) {
            return queued;
        }
        let digest = keccak256(format!("{}|{}", request.account_code, request.email_addr));
        Ok(json!(digest.to_string()))
    }

    async fn acceptance_request(&self, request: AcceptanceRequest) -> Result<Value> {
        if let Some(queued) = self.enter(RelayerEndpoint::Acceptance) {
            return queued;
        }
        lock(&self.acceptances).push(request);
        Ok(self.request_id())
    }

    async fn recovery_request(&self, request: RecoveryRequestBody) -> Result<Value> {
        if let Some(queued) = self.enter(RelayerEndpoint::Recovery) {
            return queued;
        }
        lock(&self.recoveries).push(request);
        Ok(self.request_id())
    }

    async fn complete_request(&self, request: CompleteRequest) -> Result<Value> {
        if let Some(queued) = self.enter(RelayerEndpoint::Complete) {
            return queued;
        }
        let (wallet, swap) = OwnerSwap::decode_complete_calldata(&request.complete_calldata)
            .map_err(|e| Error::RelayerRejected(e.to_string()))?;
        if wallet != request.account_eth_addr {
            return Err(Error::RelayerRejected(
                "calldata wallet does not match account".to_string(),
            ));
        }
        lock(&self.executed).push((wallet, swap));
        Ok(json!({ "status": "queued" }))
    }
}

// ============================================================================
// Chain
// ============================================================================

/// How `MockChain::wait_for_receipt` behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Confirm immediately with success
    Confirmed,
    /// Confirm immediately with a revert
    Reverted,
    /// Never confirm
    Pending,
}

/// A chain holding one recovery module with fixed templates.
pub struct MockChain {
    acceptance: TemplateSet,
    recovery: TemplateSet,
    receipt_mode: Mutex<ReceiptMode>,
    installs: Mutex<Vec<(Address, ModuleType, Address, Bytes)>>,
    reads: AtomicUsize,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    /// Acceptance template the email recovery module ships with
    pub const ACCEPTANCE_TEMPLATE: &'static str = "Accept guardian request for {ethAddr}";

    /// Single-placeholder recovery template
    pub const RECOVERY_TEMPLATE: &'static str = "Recover account {ethAddr}";

    /// Create a chain with the default templates
    #[must_use]
    pub fn new() -> Self {
        Self::with_templates(
            TemplateSet::new(vec![CommandTemplate::parse(Self::ACCEPTANCE_TEMPLATE)]),
            TemplateSet::new(vec![CommandTemplate::parse(Self::RECOVERY_TEMPLATE)]),
        )
    }

    /// Create a chain serving specific templates
    #[must_use]
    pub fn with_templates(acceptance: TemplateSet, recovery: TemplateSet) -> Self {
        Self {
            acceptance,
            recovery,
            receipt_mode: Mutex::new(ReceiptMode::Confirmed),
            installs: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Change how receipts are produced
    pub fn set_receipt_mode(&self, mode: ReceiptMode) {
        *lock(&self.receipt_mode) = mode;
    }

    /// Installs submitted so far
    #[must_use]
    pub fn installs(&self) -> Vec<(Address, ModuleType, Address, Bytes)> {
        lock(&self.installs).clone()
    }

    /// Number of read calls (commitments and templates)
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Commitment the mock derives for `(wallet, salt)`
    #[must_use]
    pub fn commitment_for(wallet: Address, salt: GuardianSalt) -> Address {
        let mut preimage = wallet.to_vec();
        preimage.extend_from_slice(salt.0.as_slice());
        Address::from_slice(&keccak256(preimage)[12..])
    }

    fn operation_hash(&self, index: usize) -> OperationHash {
        OperationHash(keccak256((index as u64).to_be_bytes()))
    }
}

#[async_trait::async_trait]
impl ChainGateway for MockChain {
    async fn compute_email_auth_address(
        &self,
        _module: Address,
        wallet: Address,
        salt: GuardianSalt,
    ) -> Result<Address> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::commitment_for(wallet, salt))
    }

    async fn acceptance_command_templates(&self, _module: Address) -> Result<TemplateSet> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.acceptance.clone())
    }

    async fn recovery_command_templates(&self, _module: Address) -> Result<TemplateSet> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.recovery.clone())
    }

    async fn install_module(
        &self,
        wallet: Address,
        module_type: ModuleType,
        module: Address,
        init_data: Bytes,
    ) -> Result<OperationHash> {
        let mut installs = lock(&self.installs);
        installs.push((wallet, module_type, module, init_data));
        Ok(self.operation_hash(installs.len()))
    }

    async fn wait_for_receipt(&self, operation: OperationHash) -> Result<Receipt> {
        let mode = *lock(&self.receipt_mode);
        match mode {
            ReceiptMode::Pending => std::future::pending().await,
            ReceiptMode::Confirmed | ReceiptMode::Reverted => Ok(Receipt {
                operation,
                block_number: 1,
                success: mode == ReceiptMode::Confirmed,
            }),
        }
    }
}

/// Shared handles to a fresh mock chain and relayer
#[must_use]
pub fn mock_gateways() -> (Arc<MockChain>, Arc<MockRelayer>) {
    (Arc::new(MockChain::new()), Arc::new(MockRelayer::new()))
}
