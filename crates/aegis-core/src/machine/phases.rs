//! Phase transitions
//!
//! Install → Accept → Request → Complete. Every phase checks its starting
//! state before touching a gateway and decodes the collaborator response
//! before advancing.

use crate::calldata::OwnerSwap;
use crate::error::{Error, Result};
use crate::gateway::{AcceptanceRequest, CompleteRequest, RecoveryRequestBody};
use crate::module_config::EncodedConfig;
use crate::schema::{decode_completion_ack, decode_request_id, CompletionAck};
use crate::template::{
    fetch_acceptance_templates, fetch_recovery_templates, render_command, Substitutions,
    TemplateSet,
};
use crate::types::{ModuleType, OperationHash, Receipt, RequestId};
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::core::RecoveryOrchestrator;
use super::phase::{Phase, RecoverySession};

impl RecoveryOrchestrator {
    // ========================================================================
    // Install
    // ========================================================================

    /// Submit the module installation and wait for it to be confirmed.
    ///
    /// On [`Error::ConfirmationTimeout`] the operation hash stays pending;
    /// use [`RecoveryOrchestrator::confirm_install`] instead of installing
    /// again.
    #[instrument(skip(self, payload), fields(wallet = %self.session.wallet))]
    pub async fn install(&mut self, payload: &EncodedConfig) -> Result<Receipt> {
        self.ensure_phase(Phase::Uninitialized, "install")?;
        if let Some(pending) = self.session.pending_install {
            return Err(Error::Precondition(format!(
                "install already submitted as {}, confirm it instead of resubmitting",
                pending
            )));
        }
        if payload.wallet != self.session.wallet {
            return Err(Error::invalid_config(
                "wallet",
                format!(
                    "payload encodes wallet {} but session is for {}",
                    payload.wallet, self.session.wallet
                ),
            ));
        }

        let submitted = self
            .chain
            .install_module(
                self.session.wallet,
                ModuleType::Executor,
                self.config.controller,
                payload.data.clone(),
            )
            .await;
        let operation = self.record(Phase::ModuleInstalled, submitted)?;

        info!(operation = %operation, "module install submitted");
        self.session.pending_install = Some(operation);
        self.session.touch();

        self.await_install(operation).await
    }

    /// Poll a previously submitted install again.
    #[instrument(skip(self), fields(wallet = %self.session.wallet))]
    pub async fn confirm_install(&mut self) -> Result<Receipt> {
        self.ensure_phase(Phase::Uninitialized, "confirm_install")?;
        let operation = self.session.pending_install.ok_or_else(|| {
            Error::Precondition("no install operation is pending".to_string())
        })?;
        self.await_install(operation).await
    }

    async fn await_install(&mut self, operation: OperationHash) -> Result<Receipt> {
        let started = Instant::now();
        let waited = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.chain.wait_for_receipt(operation),
        )
        .await;

        let outcome = match waited {
            Err(_) => Err(Error::ConfirmationTimeout {
                operation: operation.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            }),
            Ok(Err(error)) => Err(error),
            Ok(Ok(receipt)) if !receipt.success => {
                // a reverted install is final, so a new submission is allowed
                self.session.pending_install = None;
                Err(Error::Reverted(format!(
                    "install {} reverted in block {}",
                    operation, receipt.block_number
                )))
            }
            Ok(Ok(receipt)) => Ok(receipt),
        };
        let receipt = self.record(Phase::ModuleInstalled, outcome)?;

        self.session.pending_install = None;
        self.session.install_receipt = Some(receipt.clone());
        self.advance(Phase::ModuleInstalled);
        Ok(receipt)
    }

    // ========================================================================
    // Accept
    // ========================================================================

    /// Enqueue the guardian acceptance at the relayer.
    ///
    /// The relayer verifies the guardian out of band; the returned id only
    /// means the request was accepted for processing.
    #[instrument(skip(self), fields(wallet = %self.session.wallet, guardian = %self.session.guardian))]
    pub async fn accept(&mut self) -> Result<RequestId> {
        self.ensure_phase(Phase::ModuleInstalled, "accept")?;

        let outcome = self.submit_acceptance().await;
        let request_id = self.record(Phase::GuardianAccepted, outcome)?;

        self.session.acceptance_request_id = Some(request_id.clone());
        self.advance(Phase::GuardianAccepted);
        Ok(request_id)
    }

    async fn submit_acceptance(&self) -> Result<RequestId> {
        let templates =
            fetch_acceptance_templates(self.chain.as_ref(), self.config.controller).await?;
        let command = self.render(&templates)?;
        debug!(command = %command, "rendered acceptance command");

        let body = self
            .relayer
            .acceptance_request(AcceptanceRequest {
                controller_eth_addr: self.config.controller,
                guardian_email_addr: self.session.guardian.as_str().to_string(),
                account_code: self.account_code.to_hex(),
                template_idx: self.config.template_idx,
                command,
            })
            .await?;
        decode_request_id("acceptanceRequest", &body)
    }

    // ========================================================================
    // Request
    // ========================================================================

    /// Enqueue the recovery request at the relayer.
    ///
    /// Recovery templates are read fresh; they differ from the acceptance ones.
    #[instrument(skip(self), fields(wallet = %self.session.wallet, guardian = %self.session.guardian))]
    pub async fn request(&mut self) -> Result<RequestId> {
        self.ensure_phase(Phase::GuardianAccepted, "request")?;

        let outcome = self.submit_recovery().await;
        let request_id = self.record(Phase::RecoveryRequested, outcome)?;

        self.session.recovery_request_id = Some(request_id.clone());
        self.advance(Phase::RecoveryRequested);
        Ok(request_id)
    }

    async fn submit_recovery(&self) -> Result<RequestId> {
        let templates =
            fetch_recovery_templates(self.chain.as_ref(), self.config.controller).await?;
        let command = self.render(&templates)?;
        debug!(command = %command, "rendered recovery command");

        let body = self
            .relayer
            .recovery_request(RecoveryRequestBody {
                controller_eth_addr: self.config.controller,
                guardian_email_addr: self.session.guardian.as_str().to_string(),
                template_idx: self.config.template_idx,
                command,
            })
            .await?;
        decode_request_id("recoveryRequest", &body)
    }

    // ========================================================================
    // Complete
    // ========================================================================

    /// Submit the owner swap for execution.
    ///
    /// Delay and expiry are enforced by the relayer and, authoritatively,
    /// by the module on-chain.
    #[instrument(skip(self), fields(wallet = %self.session.wallet))]
    pub async fn complete(&mut self, swap: OwnerSwap) -> Result<CompletionAck> {
        self.ensure_phase(Phase::RecoveryRequested, "complete")?;

        let outcome = self.submit_completion(&swap).await;
        let ack = self.record(Phase::RecoveryCompleted, outcome)?;

        self.session.owner_swap = Some(swap);
        self.session.completion = Some(ack.clone());
        self.advance(Phase::RecoveryCompleted);
        Ok(ack)
    }

    async fn submit_completion(&self, swap: &OwnerSwap) -> Result<CompletionAck> {
        let body = self
            .relayer
            .complete_request(CompleteRequest {
                controller_eth_addr: self.config.controller,
                account_eth_addr: self.session.wallet,
                complete_calldata: swap.complete_calldata(self.session.wallet),
            })
            .await?;
        decode_completion_ack(&body)
    }

    // ========================================================================
    // Whole flow
    // ========================================================================

    /// Run every remaining phase from the current one.
    ///
    /// Stops at the first failure with the session left at the reached phase,
    /// so calling this again resumes.
    pub async fn run_to_completion(
        &mut self,
        payload: &EncodedConfig,
        swap: OwnerSwap,
    ) -> Result<&RecoverySession> {
        loop {
            match self.session.phase {
                Phase::Uninitialized if self.session.pending_install.is_some() => {
                    self.confirm_install().await?;
                }
                Phase::Uninitialized => {
                    self.install(payload).await?;
                }
                Phase::ModuleInstalled => {
                    self.accept().await?;
                }
                Phase::GuardianAccepted => {
                    self.request().await?;
                }
                Phase::RecoveryRequested => {
                    self.complete(swap).await?;
                }
                Phase::RecoveryCompleted => return Ok(&self.session),
            }
        }
    }

    fn render(&self, templates: &TemplateSet) -> Result<String> {
        let template = templates.get(self.config.template_idx)?;
        render_command(
            template,
            &Substitutions::eth_addr(self.session.wallet.to_string()),
        )
    }
}
