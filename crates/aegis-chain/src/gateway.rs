//! JSON-RPC chain gateway
//!
//! Reads go through `eth_call` against the recovery module. Installs are sent
//! with `eth_sendTransaction` from a node-managed sender that is allowed to
//! call `installModule` on the wallet. Receipts are polled with
//! `eth_getTransactionReceipt`.

use crate::error::{Error, Result};
use crate::rpc::{parse_quantity, JsonRpcClient};
use aegis_core::gateway::ChainGateway;
use aegis_core::template::TemplateSet;
use aegis_core::types::{GuardianSalt, ModuleType, OperationHash, Receipt};
use alloy_primitives::{hex, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument};

sol! {
    interface IEmailRecoveryModule {
        function computeEmailAuthAddress(address recoveredAccount, bytes32 accountSalt) external view returns (address authAddress);
        function acceptanceCommandTemplates() external pure returns (string[][] templates);
        function recoveryCommandTemplates() external pure returns (string[][] templates);
    }

    interface IERC7579Account {
        function installModule(uint256 moduleTypeId, address module, bytes initData) external payable;
    }
}

/// Default interval between receipt polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default per-request RPC timeout
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain gateway configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Account that sends install transactions; must be unlocked on the node
    pub sender: Option<Address>,
    /// Delay between receipt polls
    pub poll_interval: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ChainConfig {
    /// Create a configuration for an RPC endpoint
    #[must_use]
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            sender: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("AEGIS_RPC_URL")
            .map_err(|_| Error::NotConfigured("AEGIS_RPC_URL not set".to_string()))?;

        let mut config = Self::new(rpc_url);
        if let Ok(sender) = std::env::var("AEGIS_SENDER") {
            let sender = sender
                .parse()
                .map_err(|e| Error::NotConfigured(format!("AEGIS_SENDER: {}", e)))?;
            config = config.with_sender(sender);
        }
        Ok(config)
    }

    /// Set the transaction sender
    #[must_use]
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the receipt poll interval
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    block_number: Option<String>,
    status: Option<String>,
}

/// `ChainGateway` backed by an Ethereum JSON-RPC node
pub struct RpcChainGateway {
    rpc: JsonRpcClient,
    config: ChainConfig,
}

impl RpcChainGateway {
    /// Create a new gateway
    pub fn new(config: ChainConfig) -> Result<Self> {
        let rpc = JsonRpcClient::new(config.rpc_url.clone(), config.timeout)?;
        Ok(Self { rpc, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ChainConfig::from_env()?)
    }

    /// Gateway configuration
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    async fn eth_call<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return> {
        let data = hex::encode_prefixed(call.abi_encode());
        let output: Bytes = self
            .rpc
            .call("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?
            .ok_or_else(|| Error::InvalidResponse("eth_call returned null".to_string()))?;

        C::abi_decode_returns(&output, true).map_err(|e| Error::Decode(e.to_string()))
    }

    async fn poll_receipt(&self, operation: OperationHash) -> Result<Receipt> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .rpc
                .call("eth_getTransactionReceipt", json!([operation.0]))
                .await?;

            match receipt {
                Some(RpcReceipt {
                    block_number: Some(block),
                    status,
                }) => {
                    let block_number = parse_quantity(&block)?;
                    // pre-Byzantium receipts carry no status; treat as success
                    let success = match status {
                        Some(status) => parse_quantity(&status)? == 1,
                        None => true,
                    };
                    return Ok(Receipt {
                        operation,
                        block_number,
                        success,
                    });
                }
                _ => {
                    debug!(operation = %operation, "receipt not yet available");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }
}

/// Encode `installModule(moduleTypeId, module, initData)`
#[must_use]
pub fn install_module_calldata(module_type: ModuleType, module: Address, init_data: Bytes) -> Bytes {
    IERC7579Account::installModuleCall {
        moduleTypeId: U256::from(module_type.id()),
        module,
        initData: init_data,
    }
    .abi_encode()
    .into()
}

#[async_trait::async_trait]
impl ChainGateway for RpcChainGateway {
    #[instrument(skip(self))]
    async fn compute_email_auth_address(
        &self,
        module: Address,
        wallet: Address,
        salt: GuardianSalt,
    ) -> aegis_core::Result<Address> {
        let call = IEmailRecoveryModule::computeEmailAuthAddressCall {
            recoveredAccount: wallet,
            accountSalt: salt.0,
        };
        Ok(self.eth_call(module, &call).await?.authAddress)
    }

    #[instrument(skip(self))]
    async fn acceptance_command_templates(&self, module: Address) -> aegis_core::Result<TemplateSet> {
        let call = IEmailRecoveryModule::acceptanceCommandTemplatesCall {};
        let raw = self.eth_call(module, &call).await?.templates;
        Ok(TemplateSet::from_raw(raw))
    }

    #[instrument(skip(self))]
    async fn recovery_command_templates(&self, module: Address) -> aegis_core::Result<TemplateSet> {
        let call = IEmailRecoveryModule::recoveryCommandTemplatesCall {};
        let raw = self.eth_call(module, &call).await?.templates;
        Ok(TemplateSet::from_raw(raw))
    }

    #[instrument(skip(self, init_data), fields(init_len = init_data.len()))]
    async fn install_module(
        &self,
        wallet: Address,
        module_type: ModuleType,
        module: Address,
        init_data: Bytes,
    ) -> aegis_core::Result<OperationHash> {
        let sender = self
            .config
            .sender
            .ok_or_else(|| Error::NotConfigured("chain.sender is required to install".to_string()))?;
        let data = install_module_calldata(module_type, module, init_data);

        let hash: B256 = self
            .rpc
            .call(
                "eth_sendTransaction",
                json!([{ "from": sender, "to": wallet, "data": data }]),
            )
            .await?
            .ok_or_else(|| Error::InvalidResponse("eth_sendTransaction returned null".to_string()))?;

        info!(tx = %hash, "installModule submitted");
        Ok(OperationHash(hash))
    }

    #[instrument(skip(self))]
    async fn wait_for_receipt(&self, operation: OperationHash) -> aegis_core::Result<Receipt> {
        Ok(self.poll_receipt(operation).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_install_calldata_layout() {
        let module = Address::repeat_byte(0x22);
        let data = install_module_calldata(ModuleType::Executor, module, Bytes::from(vec![1, 2, 3]));

        assert_eq!(&data[..4], IERC7579Account::installModuleCall::SELECTOR.as_slice());
        let decoded = IERC7579Account::installModuleCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.moduleTypeId, U256::from(2u64));
        assert_eq!(decoded.module, module);
        assert_eq!(decoded.initData.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_template_return_decoding() {
        let raw = vec![vec![
            "Accept".to_string(),
            "guardian".to_string(),
            "request".to_string(),
            "for".to_string(),
            "{ethAddr}".to_string(),
        ]];
        let encoded = (raw.clone(),).abi_encode_params();
        let decoded =
            IEmailRecoveryModule::acceptanceCommandTemplatesCall::abi_decode_returns(&encoded, true)
                .unwrap();
        assert_eq!(decoded.templates, raw);
    }

    #[test]
    fn test_config_builders() {
        let config = ChainConfig::new("http://localhost:8545")
            .with_sender(Address::repeat_byte(1))
            .with_poll_interval(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.sender, Some(Address::repeat_byte(1)));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
