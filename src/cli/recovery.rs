//! Recovery protocol commands
//!
//! Every phase command resumes the saved session, runs one step and saves
//! the session again, whether the step succeeded or not.

use crate::app::App;
use aegis_core::{
    format_error_for_cli, generate_account_code, EncodedConfig, GuardianIdentity, OwnerSwap,
    Phase, RecoveryOrchestrator,
};
use alloy_primitives::Bytes;
use anyhow::Result;

/// Save the session, then surface a phase error with its hint
fn finish<T>(
    app: &App,
    orchestrator: &RecoveryOrchestrator,
    outcome: aegis_core::Result<T>,
) -> Result<T> {
    app.save(orchestrator)?;
    outcome.map_err(|error| {
        eprint!("{}", format_error_for_cli(&error));
        anyhow::Error::from(error)
    })
}

pub fn account_code() -> Result<()> {
    let code = generate_account_code();
    println!("{}", code.to_hex());
    eprintln!("Store this value as AEGIS_ACCOUNT_CODE. It cannot be recovered if lost.");
    Ok(())
}

pub async fn guardian(email: &str) -> Result<()> {
    let app = App::init()?;
    let identity = GuardianIdentity::new(email)?;
    let account_code = app.config.account_code()?;
    let generator = app.commitments()?;

    let salt = generator.derive_guardian_salt(&account_code, &identity).await?;
    let commitment = generator
        .compute_guardian_commitment(app.config.wallet()?, salt)
        .await?;

    println!("guardian:   {}", identity);
    println!("salt:       {}", salt);
    println!("commitment: {}", commitment);
    Ok(())
}

pub async fn install(guardian: Option<&str>) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;
    let payload = app.install_payload_for(&orchestrator).await?;

    let outcome = orchestrator.install(&payload).await;
    let receipt = finish(&app, &orchestrator, outcome)?;
    println!(
        "Module installed in block {} ({})",
        receipt.block_number, receipt.operation
    );
    Ok(())
}

pub async fn confirm_install(guardian: Option<&str>) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;

    let outcome = orchestrator.confirm_install().await;
    let receipt = finish(&app, &orchestrator, outcome)?;
    println!(
        "Module installed in block {} ({})",
        receipt.block_number, receipt.operation
    );
    Ok(())
}

pub async fn accept(guardian: Option<&str>) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;

    let outcome = orchestrator.accept().await;
    let request_id = finish(&app, &orchestrator, outcome)?;
    println!("Acceptance request queued: {}", request_id);
    println!("The guardian must reply to the relayer's email before `aegis request`.");
    Ok(())
}

pub async fn request(guardian: Option<&str>) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;

    let outcome = orchestrator.request().await;
    let request_id = finish(&app, &orchestrator, outcome)?;
    println!("Recovery request queued: {}", request_id);
    Ok(())
}

pub async fn complete(guardian: Option<&str>, swap: OwnerSwap) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;

    let outcome = orchestrator.complete(swap).await;
    let ack = finish(&app, &orchestrator, outcome)?;
    println!("Completion accepted by the relayer");
    if !ack.0.is_empty() {
        println!("{}", serde_json::to_string_pretty(&ack.0)?);
    }
    Ok(())
}

pub async fn run_all(guardian: Option<&str>, swap: OwnerSwap) -> Result<()> {
    let app = App::init()?;
    let mut orchestrator = app.orchestrator(guardian)?;
    // commitments are only needed while nothing has been submitted
    let payload = if orchestrator.phase() == Phase::Uninitialized
        && orchestrator.session().pending_install.is_none()
    {
        app.install_payload().await?
    } else {
        EncodedConfig {
            wallet: orchestrator.wallet(),
            data: Bytes::new(),
        }
    };

    let outcome = orchestrator
        .run_to_completion(&payload, swap)
        .await
        .map(|session| session.phase);
    let phase = finish(&app, &orchestrator, outcome)?;
    println!("Recovery finished at phase {}", phase);
    Ok(())
}
