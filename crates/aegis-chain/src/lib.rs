//! Aegis Chain - JSON-RPC access to the recovery module and wallet
//!
//! This crate provides the chain gateway used by the recovery orchestrator:
//! - Rpc: a small JSON-RPC transport over reqwest
//! - Gateway: `RpcChainGateway`, an implementation of `ChainGateway`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod gateway;
pub mod rpc;

pub use error::{Error, Result};
pub use gateway::{
    install_module_calldata, ChainConfig, RpcChainGateway, DEFAULT_POLL_INTERVAL,
    DEFAULT_RPC_TIMEOUT,
};
pub use rpc::JsonRpcClient;
