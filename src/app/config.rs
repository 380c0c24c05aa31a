//! Application configuration types
//!
//! Contains all configuration structures for the Aegis binary. Values are
//! validated once after loading and not changed afterwards.

use aegis_chain::ChainConfig;
use aegis_core::{
    AccountCode, Error, GuardianIdentity, OrchestratorConfig, DEFAULT_EXPIRY_SECS,
};
use aegis_relayer::RelayerConfig;
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub chain: ChainSection,
    pub relayer: RelayerSection,
    #[serde(default)]
    pub addresses: AddressesSection,
    pub recovery: RecoverySection,
    /// Hex account code of the wallet being recovered
    #[serde(default)]
    pub account_code: Option<SecretString>,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".aegis")
}

/// JSON-RPC endpoint settings
#[derive(Debug, Deserialize)]
pub struct ChainSection {
    pub rpc_url: String,
    #[serde(default)]
    pub sender: Option<Address>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

/// Relayer settings
#[derive(Debug, Deserialize)]
pub struct RelayerSection {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_relayer_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_relayer_timeout_secs() -> u64 {
    30
}

/// Contract addresses
#[derive(Debug, Default, Deserialize)]
pub struct AddressesSection {
    #[serde(default)]
    pub wallet: Option<Address>,
    #[serde(default)]
    pub recovery_module: Option<Address>,
    #[serde(default)]
    pub attestor: Option<Address>,
}

/// Guardian policy
#[derive(Debug, Deserialize)]
pub struct RecoverySection {
    #[serde(default)]
    pub guardians: Vec<GuardianEntry>,
    #[serde(default = "default_threshold")]
    pub threshold: u64,
    #[serde(default)]
    pub delay_secs: u64,
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
    #[serde(default)]
    pub template_idx: u64,
}

fn default_threshold() -> u64 {
    1
}

fn default_expiry_secs() -> u64 {
    DEFAULT_EXPIRY_SECS
}

/// One configured guardian
#[derive(Debug, Clone, Deserialize)]
pub struct GuardianEntry {
    pub email: String,
    #[serde(default = "default_weight")]
    pub weight: u64,
}

fn default_weight() -> u64 {
    1
}

impl RecoverySection {
    /// Same rules as `RecoveryConfig::validate`, on the configured emails.
    /// Performs no I/O.
    pub fn validate_policy(&self) -> aegis_core::Result<()> {
        if self.guardians.is_empty() {
            return Err(Error::invalid_config("guardians", "at least one guardian is required"));
        }
        let mut seen = HashSet::new();
        for entry in &self.guardians {
            let identity = GuardianIdentity::new(entry.email.as_str())?;
            if !seen.insert(identity.clone()) {
                return Err(Error::invalid_config(
                    "guardians",
                    format!("guardian {} listed twice", identity),
                ));
            }
        }
        if self.guardians.iter().any(|g| g.weight == 0) {
            return Err(Error::invalid_config("weights", "weights must be non-zero"));
        }
        if self.threshold == 0 {
            return Err(Error::invalid_config("threshold", "threshold must be at least 1"));
        }
        let total: u128 = self.guardians.iter().map(|g| u128::from(g.weight)).sum();
        if u128::from(self.threshold) > total {
            return Err(Error::invalid_config(
                "threshold",
                format!("threshold {} exceeds total weight {}", self.threshold, total),
            ));
        }
        if self.delay_secs >= self.expiry_secs {
            return Err(Error::invalid_config(
                "expiry",
                format!(
                    "delay {}s must be shorter than expiry {}s",
                    self.delay_secs, self.expiry_secs
                ),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Check what every command needs. The guardian policy is checked by
    /// [`RecoverySection::validate_policy`] before an install touches a gateway.
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_url.trim().is_empty() {
            bail!("chain.rpc_url must not be empty");
        }
        if self.relayer.base_url.trim().is_empty() {
            bail!("relayer.base_url must not be empty");
        }
        if self.chain.poll_interval_ms == 0 {
            bail!("chain.poll_interval_ms must be positive");
        }
        for entry in &self.recovery.guardians {
            GuardianIdentity::new(entry.email.as_str())
                .with_context(|| format!("recovery.guardians: {}", entry.email))?;
        }
        if let Some(code) = &self.account_code {
            AccountCode::from_hex(code.expose_secret()).context("account_code")?;
        }
        Ok(())
    }

    /// Configured wallet address
    pub fn wallet(&self) -> Result<Address> {
        self.addresses
            .wallet
            .context("addresses.wallet is not set (AEGIS_ADDRESSES__WALLET)")
    }

    /// Configured recovery module address
    pub fn recovery_module(&self) -> Result<Address> {
        self.addresses
            .recovery_module
            .context("addresses.recovery_module is not set (AEGIS_ADDRESSES__RECOVERY_MODULE)")
    }

    /// Parsed account code
    pub fn account_code(&self) -> Result<AccountCode> {
        let code = self
            .account_code
            .as_ref()
            .context("account_code is not set; run `aegis account-code` and export AEGIS_ACCOUNT_CODE")?;
        AccountCode::from_hex(code.expose_secret()).context("account_code")
    }

    /// Guardian identities in configuration order
    pub fn guardians(&self) -> Result<Vec<GuardianIdentity>> {
        self.recovery
            .guardians
            .iter()
            .map(|g| GuardianIdentity::new(g.email.as_str()).map_err(anyhow::Error::from))
            .collect()
    }

    /// Guardian driven through acceptance and recovery
    pub fn active_guardian(&self, email: Option<&str>) -> Result<GuardianIdentity> {
        match email {
            Some(email) => {
                let wanted = GuardianIdentity::new(email)?;
                if !self.guardians()?.contains(&wanted) {
                    bail!("{} is not a configured guardian", wanted);
                }
                Ok(wanted)
            }
            None => self
                .guardians()?
                .into_iter()
                .next()
                .context("recovery.guardians is empty"),
        }
    }

    /// Chain gateway settings
    pub fn chain_config(&self) -> ChainConfig {
        let mut config = ChainConfig::new(self.chain.rpc_url.clone())
            .with_poll_interval(Duration::from_millis(self.chain.poll_interval_ms));
        if let Some(sender) = self.chain.sender {
            config = config.with_sender(sender);
        }
        config
    }

    /// Relayer client settings
    pub fn relayer_config(&self) -> RelayerConfig {
        let mut config = RelayerConfig::new(self.relayer.base_url.clone())
            .with_timeout(Duration::from_secs(self.relayer.timeout_secs));
        if let Some(key) = &self.relayer.api_key {
            config = config.with_api_key(key.expose_secret());
        }
        config
    }

    /// Orchestrator settings
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        Ok(OrchestratorConfig::new(self.recovery_module()?)
            .with_template_idx(self.recovery.template_idx)
            .with_confirmation_timeout(Duration::from_secs(
                self.chain.confirmation_timeout_secs,
            )))
    }
}

#[cfg(test)]
impl AppConfig {
    /// Embedded defaults overlaid with `extra`
    pub(crate) fn from_toml(extra: &str) -> Self {
        use crate::app::loader::DEFAULT_CONFIG;
        use config::{Config, File, FileFormat};

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(extra, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> AppConfig {
        AppConfig::from_toml(extra)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse("");
        config.validate().unwrap();
        assert_eq!(config.recovery.expiry_secs, DEFAULT_EXPIRY_SECS);
        assert_eq!(config.recovery.template_idx, 0);
        assert!(config.account_code.is_none());
    }

    #[test]
    fn test_bad_guardian_email_is_rejected() {
        let config = parse(
            r#"
            [[recovery.guardians]]
            email = "not-an-email"
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_active_guardian_defaults_to_first() {
        let config = parse(
            r#"
            [[recovery.guardians]]
            email = "first@example.com"

            [[recovery.guardians]]
            email = "second@example.com"
            weight = 2
            "#,
        );
        assert_eq!(config.active_guardian(None).unwrap().as_str(), "first@example.com");
        assert_eq!(
            config.active_guardian(Some("second@example.com")).unwrap().as_str(),
            "second@example.com"
        );
        assert!(config.active_guardian(Some("other@example.com")).is_err());
        assert_eq!(config.recovery.guardians[1].weight, 2);
    }

    #[test]
    fn test_account_code_is_redacted() {
        let config = parse(&format!("account_code = \"{}\"", "0a".repeat(32)));
        assert!(!format!("{:?}", config).contains(&"0a".repeat(32)));
        assert_eq!(config.account_code().unwrap().to_hex(), "0a".repeat(32));
    }

    #[test]
    fn test_missing_addresses_are_reported() {
        let config = parse("");
        assert!(config.wallet().is_err());
        assert!(config.orchestrator_config().is_err());
    }

    #[test]
    fn test_policy_rules() {
        let one = r#"
            [[recovery.guardians]]
            email = "first@example.com"
        "#;
        parse(one).recovery.validate_policy().unwrap();

        let over = parse(&format!("[recovery]\nthreshold = 5\n{}", one));
        assert!(matches!(
            over.recovery.validate_policy(),
            Err(Error::InvalidConfig { ref field, .. }) if field == "threshold"
        ));

        let late = parse(&format!("[recovery]\ndelay_secs = 1209600\n{}", one));
        assert!(late.recovery.validate_policy().is_err());

        let duplicate = parse(
            r#"
            [[recovery.guardians]]
            email = "first@example.com"

            [[recovery.guardians]]
            email = " first@example.com "
            "#,
        );
        assert!(duplicate.recovery.validate_policy().is_err());

        assert!(parse("").recovery.validate_policy().is_err());
    }
}
