//! CLI module for Aegis
//!
//! Each subcommand drives one step of the recovery protocol for the
//! configured wallet:
//! - `account-code`: generate a fresh account code
//! - `guardian`: derive a guardian's salt and commitment
//! - `install` / `confirm-install`: install the recovery module
//! - `accept`, `request`, `complete`: relayer phases
//! - `run`: every remaining phase in order
//! - `status` / `reset`: inspect or discard the saved session

use aegis_core::OwnerSwap;
use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};

pub mod recovery;
pub mod status;

/// Aegis guardian recovery CLI
#[derive(Parser, Debug)]
#[command(name = "aegis")]
#[command(about = "Guardian-based social recovery for email-guarded smart wallets")]
#[command(version)]
pub struct Cli {
    /// Guardian that accepts and requests recovery (defaults to the first configured)
    #[arg(long, global = true)]
    pub guardian: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new account code
    AccountCode,
    /// Derive the salt and on-chain commitment of a guardian
    Guardian {
        /// Guardian email address
        email: String,
    },
    /// Install the recovery module with the configured guardian policy
    Install,
    /// Wait again for a previously submitted install
    ConfirmInstall,
    /// Send the guardian acceptance request
    Accept,
    /// Send the recovery request
    Request,
    /// Ask the relayer to execute the owner swap
    Complete(SwapArgs),
    /// Run every remaining phase
    Run(SwapArgs),
    /// Show the saved session
    Status,
    /// Delete the saved session
    Reset,
}

/// Owner swap executed on completion
#[derive(Args, Debug, Clone)]
pub struct SwapArgs {
    /// Owner preceding the old owner in the wallet's owner list
    #[arg(long)]
    pub prev_owner: Address,
    /// Owner being replaced
    #[arg(long)]
    pub old_owner: Address,
    /// Replacement owner
    #[arg(long)]
    pub new_owner: Address,
}

impl From<SwapArgs> for OwnerSwap {
    fn from(args: SwapArgs) -> Self {
        OwnerSwap::new(args.prev_owner, args.old_owner, args.new_owner)
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let guardian = cli.guardian.as_deref();
    match cli.command {
        Some(Commands::AccountCode) => recovery::account_code(),
        Some(Commands::Guardian { email }) => recovery::guardian(&email).await,
        Some(Commands::Install) => recovery::install(guardian).await,
        Some(Commands::ConfirmInstall) => recovery::confirm_install(guardian).await,
        Some(Commands::Accept) => recovery::accept(guardian).await,
        Some(Commands::Request) => recovery::request(guardian).await,
        Some(Commands::Complete(swap)) => recovery::complete(guardian, swap.into()).await,
        Some(Commands::Run(swap)) => recovery::run_all(guardian, swap.into()).await,
        Some(Commands::Status) => status::show(),
        Some(Commands::Reset) => status::reset(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
