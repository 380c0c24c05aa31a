//! Core recovery types
//!
//! Identity and commitment values that flow between the generator,
//! the configuration builder and the state machine.

use crate::error::{Error, Result};
use alloy_primitives::{hex, uint, Address, B256, U256};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Order of the BN254 scalar field the relayer's Poseidon hash works over.
pub const BN254_SCALAR_MODULUS: U256 =
    uint!(0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001_U256);

// ============================================================================
// Account code
// ============================================================================

/// Secret field element bound to one wallet.
///
/// The value is stored big-endian and wiped on drop. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccountCode {
    bytes: [u8; 32],
}

impl AccountCode {
    /// Sample a uniformly random field element from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // modulus < 2^254, so clearing the top two bits keeps rejection rare
            bytes[0] &= 0x3f;
            if U256::from_be_bytes(bytes) < BN254_SCALAR_MODULUS {
                return Self { bytes };
            }
            bytes.zeroize();
        }
    }

    /// Wrap raw big-endian bytes, rejecting values outside the field.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self> {
        if U256::from_be_bytes(bytes) >= BN254_SCALAR_MODULUS {
            return Err(Error::invalid_config(
                "account_code",
                "value is not a BN254 scalar field element",
            ));
        }
        Ok(Self { bytes })
    }

    /// Parse a 64-digit hex string, with or without a `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() != 64 {
            return Err(Error::invalid_config(
                "account_code",
                format!("expected 64 hex digits, got {}", digits.len()),
            ));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| Error::invalid_config("account_code", e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Relayer wire form: 64 lowercase hex digits without a prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Field element as an integer
    #[must_use]
    pub fn as_u256(&self) -> U256 {
        U256::from_be_bytes(self.bytes)
    }
}

impl fmt::Debug for AccountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCode")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Guardian identity and commitments
// ============================================================================

/// Off-chain identity of a guardian (an email address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuardianIdentity(String);

impl GuardianIdentity {
    /// Validate and wrap an email address.
    pub fn new(email: impl Into<String>) -> Result<Self> {
        let email = email.into().trim().to_string();
        let mut parts = email.split('@');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
            }
            _ => false,
        };
        if !valid {
            return Err(Error::invalid_config(
                "guardian",
                format!("'{}' is not an email address", email),
            ));
        }
        Ok(Self(email))
    }

    /// Email address as sent to the relayer
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuardianIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<GuardianIdentity> for String {
    fn from(value: GuardianIdentity) -> Self {
        value.0
    }
}

impl fmt::Display for GuardianIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Salt binding a guardian identity to an account code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardianSalt(pub B256);

impl fmt::Display for GuardianSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-chain address standing in for a guardian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardianCommitment(pub Address);

impl GuardianCommitment {
    /// Underlying address
    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }
}

impl fmt::Display for GuardianCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Relayer and chain handles
// ============================================================================

/// Opaque request id assigned by the relayer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash identifying a submitted on-chain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHash(pub B256);

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confirmation of an included operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Operation the receipt belongs to
    pub operation: OperationHash,
    /// Block that included it
    pub block_number: u64,
    /// Whether execution succeeded
    pub success: bool,
}

/// ERC-7579 module types accepted by `installModule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Validator module
    Validator,
    /// Executor module (the recovery module is one)
    Executor,
    /// Fallback handler
    Fallback,
    /// Hook module
    Hook,
}

impl ModuleType {
    /// Numeric id used on-chain
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Validator => 1,
            Self::Executor => 2,
            Self::Fallback => 3,
            Self::Hook => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_field_elements() {
        for _ in 0..64 {
            let code = AccountCode::generate();
            assert!(code.as_u256() < BN254_SCALAR_MODULUS);
            assert_eq!(code.to_hex().len(), 64);
        }
    }

    #[test]
    fn test_account_code_hex_accepts_prefix() {
        let hex = "0x00000000000000000000000000000000000000000000000000000000000000ff";
        let code = AccountCode::from_hex(hex).unwrap();
        assert_eq!(code.as_u256(), U256::from(255u64));
        assert_eq!(code.to_hex(), &hex[2..]);
    }

    #[test]
    fn test_account_code_rejects_modulus() {
        let bytes = BN254_SCALAR_MODULUS.to_be_bytes::<32>();
        assert!(AccountCode::from_bytes(bytes).is_err());
        assert!(AccountCode::from_hex("abcd").is_err());
    }

    #[test]
    fn test_account_code_debug_is_redacted() {
        let code = AccountCode::from_hex(&"11".repeat(32)).unwrap();
        let debug = format!("{:?}", code);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("1111"));
    }

    #[test]
    fn test_guardian_identity_validation() {
        assert_eq!(
            GuardianIdentity::new(" guardian@gmail.com ").unwrap().as_str(),
            "guardian@gmail.com"
        );
        assert!(GuardianIdentity::new("guardian").is_err());
        assert!(GuardianIdentity::new("@gmail.com").is_err());
        assert!(GuardianIdentity::new("a@b@c").is_err());
        assert!(GuardianIdentity::new("a b@c.com").is_err());
    }

    #[test]
    fn test_guardian_identity_serde() {
        let id: GuardianIdentity = serde_json::from_str("\"g@example.org\"").unwrap();
        assert_eq!(id.as_str(), "g@example.org");
        assert!(serde_json::from_str::<GuardianIdentity>("\"nope\"").is_err());
    }

    #[test]
    fn test_executor_module_id() {
        assert_eq!(ModuleType::Executor.id(), 2);
    }
}
