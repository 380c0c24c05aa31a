//! Recovery module configuration
//!
//! Validates a guardian policy and encodes it as the `initData` the email
//! recovery module expects on installation:
//!
//! ```text
//! (address account, bytes isInstalledContext, bytes4 recoverySelector,
//!  address[] guardians, uint256[] weights, uint256 threshold,
//!  uint256 delay, uint256 expiry)
//! ```

use crate::calldata::SWAP_OWNER_SELECTOR;
use crate::error::{Error, Result};
use crate::types::GuardianCommitment;
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Two weeks, the expiry the module is usually installed with.
pub const DEFAULT_EXPIRY_SECS: u64 = 2 * 7 * 24 * 60 * 60;

type InstallTuple = (
    Address,
    Bytes,
    FixedBytes<4>,
    Vec<Address>,
    Vec<U256>,
    U256,
    U256,
    U256,
);

/// Guardian policy of a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Guardian commitments, in installation order
    pub guardians: Vec<GuardianCommitment>,
    /// Weight of each guardian (parallel to `guardians`)
    pub weights: Vec<u64>,
    /// Total weight needed to recover
    pub threshold: u64,
    /// Seconds between a recovery request and its earliest execution
    pub delay: u64,
    /// Seconds after which a pending request expires
    pub expiry: u64,
}

impl RecoveryConfig {
    /// Build and validate a policy
    pub fn new(
        guardians: Vec<GuardianCommitment>,
        weights: Vec<u64>,
        threshold: u64,
        delay: u64,
        expiry: u64,
    ) -> Result<Self> {
        let config = Self {
            guardians,
            weights,
            threshold,
            delay,
            expiry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Single guardian, threshold 1, no delay, two week expiry
    pub fn single_guardian(guardian: GuardianCommitment) -> Result<Self> {
        Self::new(vec![guardian], vec![1], 1, 0, Self::default_expiry())
    }

    /// Expiry used when none is configured
    #[must_use]
    pub fn default_expiry() -> u64 {
        DEFAULT_EXPIRY_SECS
    }

    /// Sum of all guardian weights
    #[must_use]
    pub fn total_weight(&self) -> u128 {
        self.weights.iter().map(|w| u128::from(*w)).sum()
    }

    /// Check every policy invariant. Performs no I/O.
    pub fn validate(&self) -> Result<()> {
        if self.guardians.is_empty() {
            return Err(Error::invalid_config("guardians", "at least one guardian is required"));
        }
        if self.guardians.len() != self.weights.len() {
            return Err(Error::invalid_config(
                "weights",
                format!(
                    "{} guardians but {} weights",
                    self.guardians.len(),
                    self.weights.len()
                ),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.guardians.iter().find(|g| !seen.insert(**g)) {
            return Err(Error::invalid_config(
                "guardians",
                format!("guardian {} listed twice", dup),
            ));
        }
        if self.weights.iter().any(|w| *w == 0) {
            return Err(Error::invalid_config("weights", "weights must be non-zero"));
        }
        if self.threshold == 0 {
            return Err(Error::invalid_config("threshold", "threshold must be at least 1"));
        }
        let total = self.total_weight();
        if u128::from(self.threshold) > total {
            return Err(Error::invalid_config(
                "threshold",
                format!(
                    "threshold {} exceeds total weight {}",
                    self.threshold, total
                ),
            ));
        }
        if self.delay >= self.expiry {
            return Err(Error::invalid_config(
                "expiry",
                format!(
                    "delay {}s must be shorter than expiry {}s",
                    self.delay, self.expiry
                ),
            ));
        }
        Ok(())
    }
}

/// Installation payload, consumable by the chain gateway's module install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedConfig {
    /// Wallet the module is installed on
    pub wallet: Address,
    /// ABI-encoded `initData`
    pub data: Bytes,
}

/// Validate the policy and encode the module `initData`.
///
/// Fails with [`Error::InvalidConfig`] before anything is encoded.
pub fn build_install_payload(
    wallet: Address,
    guardians: Vec<GuardianCommitment>,
    weights: Vec<u64>,
    threshold: u64,
    delay: u64,
    expiry: u64,
) -> Result<EncodedConfig> {
    let config = RecoveryConfig::new(guardians, weights, threshold, delay, expiry)?;
    Ok(encode_config(wallet, &config))
}

/// Encode an already validated policy.
#[must_use]
pub fn encode_config(wallet: Address, config: &RecoveryConfig) -> EncodedConfig {
    // isInstalledContext is a single zero byte for Safe 7579 adapters
    let tuple: InstallTuple = (
        wallet,
        Bytes::from(vec![0u8]),
        FixedBytes::from(SWAP_OWNER_SELECTOR),
        config.guardians.iter().map(GuardianCommitment::address).collect(),
        config.weights.iter().map(|w| U256::from(*w)).collect(),
        U256::from(config.threshold),
        U256::from(config.delay),
        U256::from(config.expiry),
    );

    EncodedConfig {
        wallet,
        data: tuple.abi_encode_params().into(),
    }
}

/// Decode `initData` back into the wallet and its policy.
pub fn decode_install_payload(data: &[u8]) -> Result<(Address, RecoveryConfig)> {
    let (wallet, _context, selector, guardians, weights, threshold, delay, expiry) =
        InstallTuple::abi_decode_params(data, true)
            .map_err(|e| Error::Validation(format!("install payload: {}", e)))?;

    if selector.0 != SWAP_OWNER_SELECTOR {
        return Err(Error::Validation(format!(
            "install payload: unexpected recovery selector {}",
            selector
        )));
    }

    let config = RecoveryConfig {
        guardians: guardians.into_iter().map(GuardianCommitment).collect(),
        weights: weights
            .iter()
            .map(|w| to_u64("weights", *w))
            .collect::<Result<_>>()?,
        threshold: to_u64("threshold", threshold)?,
        delay: to_u64("delay", delay)?,
        expiry: to_u64("expiry", expiry)?,
    };
    Ok((wallet, config))
}

fn to_u64(field: &str, value: U256) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| Error::Validation(format!("install payload: {} does not fit in u64", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn guardian(byte: u8) -> GuardianCommitment {
        GuardianCommitment(Address::repeat_byte(byte))
    }

    fn wallet() -> Address {
        address!("5afe00000000000000000000000000000000cafe")
    }

    #[test]
    fn test_valid_policies_build() {
        for (weights, threshold) in [(vec![1], 1), (vec![1, 2], 3), (vec![5, 1, 1], 2)] {
            let guardians = (1..=weights.len() as u8).map(guardian).collect();
            assert!(
                build_install_payload(wallet(), guardians, weights, threshold, 0, 10).is_ok()
            );
        }
    }

    #[test]
    fn test_threshold_above_total_weight_fails() {
        let err = build_install_payload(
            wallet(),
            vec![guardian(1), guardian(2)],
            vec![1, 1],
            3,
            0,
            DEFAULT_EXPIRY_SECS,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { ref field, .. } if field == "threshold"));
    }

    #[test]
    fn test_precondition_failures() {
        let cases = [
            (vec![guardian(1)], vec![1, 1], 1, 0, 10, "weights"),
            (vec![guardian(1)], vec![1], 0, 0, 10, "threshold"),
            (vec![guardian(1)], vec![1], 1, 10, 10, "expiry"),
            (vec![], vec![], 1, 0, 10, "guardians"),
            (vec![guardian(1), guardian(1)], vec![1, 1], 1, 0, 10, "guardians"),
            (vec![guardian(1)], vec![0], 1, 0, 10, "weights"),
        ];
        for (guardians, weights, threshold, delay, expiry, expected) in cases {
            match build_install_payload(wallet(), guardians, weights, threshold, delay, expiry) {
                Err(Error::InvalidConfig { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidConfig({}), got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_payload_round_trip() {
        let config = RecoveryConfig::new(
            vec![guardian(0xaa), guardian(0xbb), guardian(0xcc)],
            vec![2, 1, 1],
            3,
            3600,
            DEFAULT_EXPIRY_SECS,
        )
        .unwrap();

        let encoded = encode_config(wallet(), &config);
        let (decoded_wallet, decoded) = decode_install_payload(&encoded.data).unwrap();

        assert_eq!(decoded_wallet, wallet());
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_default_expiry_is_two_weeks() {
        let config = RecoveryConfig::single_guardian(guardian(1)).unwrap();
        assert_eq!(config.expiry, 1_209_600);
        assert_eq!(RecoveryConfig::default_expiry(), config.expiry);
        assert_eq!(config.total_weight(), 1);
    }
}
