//! Guardian commitments
//!
//! A guardian never appears on-chain by email. The relayer derives a salt
//! from (account code, email) and the module maps (wallet, salt) to the
//! address of the guardian's future email-auth contract.

use crate::error::Result;
use crate::gateway::{AccountSaltRequest, ChainGateway, RelayerGateway};
use crate::schema::decode_account_salt;
use crate::types::{AccountCode, GuardianCommitment, GuardianIdentity, GuardianSalt};
use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Generate a fresh account code for a wallet.
#[must_use]
pub fn generate_account_code() -> AccountCode {
    AccountCode::generate()
}

/// Derives guardian salts and commitments through the collaborators.
pub struct CommitmentGenerator {
    relayer: Arc<dyn RelayerGateway>,
    chain: Arc<dyn ChainGateway>,
    module: Address,
}

impl CommitmentGenerator {
    /// Create a generator bound to a recovery module
    #[must_use]
    pub fn new(
        relayer: Arc<dyn RelayerGateway>,
        chain: Arc<dyn ChainGateway>,
        module: Address,
    ) -> Self {
        Self {
            relayer,
            chain,
            module,
        }
    }

    /// Ask the relayer for the salt of `(account_code, guardian)`.
    ///
    /// Transport failures are returned as-is; nothing is retried here.
    #[instrument(skip(self, account_code), fields(guardian = %guardian))]
    pub async fn derive_guardian_salt(
        &self,
        account_code: &AccountCode,
        guardian: &GuardianIdentity,
    ) -> Result<GuardianSalt> {
        let body = self
            .relayer
            .get_account_salt(AccountSaltRequest {
                account_code: account_code.to_hex(),
                email_addr: guardian.as_str().to_string(),
            })
            .await?;

        let salt = decode_account_salt(&body)?;
        debug!(salt = %salt, "derived guardian salt");
        Ok(salt)
    }

    /// Read the guardian commitment address for `wallet` from the module.
    #[instrument(skip(self))]
    pub async fn compute_guardian_commitment(
        &self,
        wallet: Address,
        salt: GuardianSalt,
    ) -> Result<GuardianCommitment> {
        let address = self
            .chain
            .compute_email_auth_address(self.module, wallet, salt)
            .await?;
        Ok(GuardianCommitment(address))
    }

    /// Salt derivation followed by the commitment read.
    pub async fn commit_guardian(
        &self,
        account_code: &AccountCode,
        wallet: Address,
        guardian: &GuardianIdentity,
    ) -> Result<GuardianCommitment> {
        let salt = self.derive_guardian_salt(account_code, guardian).await?;
        self.compute_guardian_commitment(wallet, salt).await
    }
}
