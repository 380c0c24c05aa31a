//! Session inspection commands

use crate::app::{load_config, SessionStore};
use anyhow::Result;

pub fn show() -> Result<()> {
    let config = load_config()?;
    let wallet = config.wallet()?;
    let store = SessionStore::new(config.state_dir.clone());

    println!("wallet:          {}", wallet);
    if let Some(module) = config.addresses.recovery_module {
        println!("recovery module: {}", module);
    }
    if let Some(attestor) = config.addresses.attestor {
        println!("attestor:        {}", attestor);
    }

    println!("state dir:       {}", store.dir().display());

    let Some(session) = store.load(wallet)? else {
        println!("phase:           uninitialized (no saved session)");
        return Ok(());
    };

    println!("guardian:        {}", session.guardian);
    println!("phase:           {}", session.phase);
    if let Some(op) = session.pending_install {
        println!("pending install: {}", op);
    }
    if let Some(receipt) = &session.install_receipt {
        println!("installed:       block {}", receipt.block_number);
    }
    if let Some(id) = &session.acceptance_request_id {
        println!("acceptance id:   {}", id);
    }
    if let Some(id) = &session.recovery_request_id {
        println!("recovery id:     {}", id);
    }
    if let Some(swap) = &session.owner_swap {
        println!("owner swap:      {} -> {}", swap.old_owner, swap.new_owner);
    }
    if let Some(failure) = &session.last_failure {
        println!(
            "last failure:    {} while reaching {} ({}){}",
            failure.kind,
            failure.attempted,
            failure.message,
            if failure.transient { ", retryable" } else { "" }
        );
    }
    println!("updated:         {}", session.updated_at.to_rfc3339());
    Ok(())
}

pub fn reset() -> Result<()> {
    let config = load_config()?;
    let wallet = config.wallet()?;
    let store = SessionStore::new(config.state_dir.clone());

    if store.remove(wallet)? {
        println!("Removed session for {}", wallet);
    } else {
        println!("No session saved for {}", wallet);
    }
    Ok(())
}
