//! Aegis Relayer - HTTP client for the email-auth relayer
//!
//! This crate provides the relayer gateway used by the recovery orchestrator:
//! - Client: `HttpRelayer`, a reqwest implementation of `RelayerGateway`
//! - Util: key masking and error sanitizing

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod util;

pub use client::{HttpRelayer, RelayerConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
