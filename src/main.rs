//! Aegis - guardian-based social recovery
//!
//! CLI entry point driving the recovery protocol for one wallet.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis=info,aegis_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = cli::Cli::parse();

    if cli.command.is_some() {
        debug!("Aegis v{}", env!("CARGO_PKG_VERSION"));

        if !std::path::Path::new(".env").exists() && std::env::var("AEGIS_ACCOUNT_CODE").is_err() {
            warn!(".env file not found and AEGIS_ACCOUNT_CODE is unset");
        }
    }

    cli::run(cli).await
}
