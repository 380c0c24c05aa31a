//! Recovery state machine
//!
//! Ties the commitment, configuration and template pieces to the chain and
//! relayer gateways.
//!
//! # Module Structure
//!
//! - `phase`: `Phase`, `RecoverySession` and failure records
//! - `config`: `OrchestratorConfig`
//! - `core`: `RecoveryOrchestrator` struct and shared bookkeeping
//! - `phases`: install, accept, request, complete

mod config;
mod core;
mod phase;
mod phases;


pub use config::{OrchestratorConfig, DEFAULT_CONFIRMATION_TIMEOUT};
pub use core::RecoveryOrchestrator;
pub use phase::{Phase, PhaseFailure, RecoverySession};
