//! Application wiring
//!
//! Builds the gateways from configuration and hands out orchestrators whose
//! sessions are loaded from and saved to the session store.

pub mod config;
pub mod loader;
pub mod store;

pub use config::AppConfig;
pub use loader::load_config;
pub use store::SessionStore;

use aegis_chain::RpcChainGateway;
use aegis_core::{
    build_install_payload, ChainGateway, CommitmentGenerator, EncodedConfig, Error,
    GuardianCommitment, Phase, RecoveryOrchestrator, RecoverySession, RelayerGateway,
};
use aegis_relayer::HttpRelayer;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

/// Loaded configuration plus live gateways
pub struct App {
    pub config: AppConfig,
    pub chain: Arc<dyn ChainGateway>,
    pub relayer: Arc<dyn RelayerGateway>,
    pub store: SessionStore,
}

impl App {
    /// Load configuration and connect the gateways
    pub fn init() -> Result<Self> {
        let config = load_config()?;
        let chain = RpcChainGateway::new(config.chain_config()).context("chain gateway")?;
        let relayer = HttpRelayer::new(config.relayer_config()).context("relayer gateway")?;
        let store = SessionStore::new(config.state_dir.clone());

        Ok(Self {
            config,
            chain: Arc::new(chain),
            relayer: Arc::new(relayer),
            store,
        })
    }

    /// Commitment generator bound to the configured module
    pub fn commitments(&self) -> Result<CommitmentGenerator> {
        Ok(CommitmentGenerator::new(
            self.relayer.clone(),
            self.chain.clone(),
            self.config.recovery_module()?,
        ))
    }

    /// Commit every configured guardian and encode the install payload.
    ///
    /// The policy is checked before any guardian is committed.
    pub async fn install_payload(&self) -> Result<EncodedConfig> {
        self.config.recovery.validate_policy()?;
        let wallet = self.config.wallet()?;
        let account_code = self.config.account_code()?;
        let generator = self.commitments()?;

        let mut guardians: Vec<GuardianCommitment> = Vec::new();
        for identity in self.config.guardians()? {
            let commitment = generator
                .commit_guardian(&account_code, wallet, &identity)
                .await
                .with_context(|| format!("committing guardian {}", identity))?;
            info!(guardian = %identity, commitment = %commitment, "guardian committed");
            guardians.push(commitment);
        }

        let recovery = &self.config.recovery;
        let weights = recovery.guardians.iter().map(|g| g.weight).collect();
        Ok(build_install_payload(
            wallet,
            guardians,
            weights,
            recovery.threshold,
            recovery.delay_secs,
            recovery.expiry_secs,
        )?)
    }

    /// Install payload for `orchestrator`, refused before any gateway call
    /// when its session is past install or has an install pending
    pub async fn install_payload_for(
        &self,
        orchestrator: &RecoveryOrchestrator,
    ) -> Result<EncodedConfig> {
        let session = orchestrator.session();
        if let Some(pending) = session.pending_install {
            return Err(Error::Precondition(format!(
                "install already submitted as {}, run `aegis confirm-install`",
                pending
            ))
            .into());
        }
        if session.phase != Phase::Uninitialized {
            return Err(Error::Precondition(format!(
                "install requires phase {}, session is at {}",
                Phase::Uninitialized,
                session.phase
            ))
            .into());
        }
        self.install_payload().await
    }

    /// Orchestrator for the configured wallet, resumed from the store
    pub fn orchestrator(&self, guardian: Option<&str>) -> Result<RecoveryOrchestrator> {
        let wallet = self.config.wallet()?;
        let session = match self.store.load(wallet)? {
            Some(session) => {
                if let Some(email) = guardian {
                    let wanted = self.config.active_guardian(Some(email))?;
                    if wanted != session.guardian {
                        bail!(
                            "session for {} is driven by {}; remove {} to start over",
                            wallet,
                            session.guardian,
                            self.store.path_for(wallet).display()
                        );
                    }
                }
                session
            }
            None => RecoverySession::new(wallet, self.config.active_guardian(guardian)?),
        };

        Ok(RecoveryOrchestrator::resume(
            self.chain.clone(),
            self.relayer.clone(),
            self.config.orchestrator_config()?,
            self.config.account_code()?,
            session,
        ))
    }

    /// Persist the orchestrator's session
    pub fn save(&self, orchestrator: &RecoveryOrchestrator) -> Result<()> {
        self.store.save(orchestrator.session())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::mock::{mock_gateways, MockChain, MockRelayer};
    use aegis_core::OperationHash;
    use alloy_primitives::B256;

    const BASE: &str = r#"
        account_code = "0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"

        [addresses]
        wallet = "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a"
        recovery_module = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
    "#;

    fn app(extra: &str, state_dir: &std::path::Path) -> (App, Arc<MockChain>, Arc<MockRelayer>) {
        let config = AppConfig::from_toml(&format!("{}\n{}", BASE, extra));
        let (chain, relayer) = mock_gateways();
        let app = App {
            config,
            chain: chain.clone(),
            relayer: relayer.clone(),
            store: SessionStore::new(state_dir),
        };
        (app, chain, relayer)
    }

    const ONE_GUARDIAN: &str = r#"
        [recovery]
        threshold = 1

        [[recovery.guardians]]
        email = "guardian@example.com"
    "#;

    #[tokio::test]
    async fn test_threshold_above_weight_fails_without_gateway_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (app, chain, relayer) = app(
            r#"
            [recovery]
            threshold = 5

            [[recovery.guardians]]
            email = "guardian@example.com"
            weight = 1
            "#,
            dir.path(),
        );

        let err = app.install_payload().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidConfig { .. })
        ));
        assert_eq!(relayer.total_calls(), 0);
        assert_eq!(chain.reads(), 0);
    }

    #[tokio::test]
    async fn test_valid_policy_commits_each_guardian() {
        let dir = tempfile::tempdir().unwrap();
        let (app, chain, relayer) = app(ONE_GUARDIAN, dir.path());

        let payload = app.install_payload().await.unwrap();
        assert_eq!(payload.wallet, app.config.wallet().unwrap());
        assert_eq!(relayer.total_calls(), 1);
        assert_eq!(chain.reads(), 1);
    }

    #[tokio::test]
    async fn test_repeated_install_is_refused_before_gateway_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (app, chain, relayer) = app(ONE_GUARDIAN, dir.path());

        let mut orchestrator = app.orchestrator(None).unwrap();
        let payload = app.install_payload_for(&orchestrator).await.unwrap();
        orchestrator.install(&payload).await.unwrap();
        app.save(&orchestrator).unwrap();

        let relayer_calls = relayer.total_calls();
        let chain_reads = chain.reads();

        let resumed = app.orchestrator(None).unwrap();
        assert_eq!(resumed.phase(), Phase::ModuleInstalled);
        let err = app.install_payload_for(&resumed).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Precondition(_))));

        assert_eq!(relayer.total_calls(), relayer_calls);
        assert_eq!(chain.reads(), chain_reads);
        assert_eq!(chain.installs().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_install_is_refused_before_gateway_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (app, chain, relayer) = app(ONE_GUARDIAN, dir.path());

        let mut session = RecoverySession::new(
            app.config.wallet().unwrap(),
            app.config.active_guardian(None).unwrap(),
        );
        session.pending_install = Some(OperationHash(B256::repeat_byte(7)));
        app.store.save(&session).unwrap();

        let orchestrator = app.orchestrator(None).unwrap();
        let err = app.install_payload_for(&orchestrator).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Precondition(_))));
        assert_eq!(relayer.total_calls(), 0);
        assert_eq!(chain.reads(), 0);
    }
}
