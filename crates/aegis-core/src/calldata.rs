//! Recovery calldata
//!
//! The call the module executes once recovery completes is a Safe
//! `swapOwner`. The relayer receives it wrapped as
//! `abi.encode(address wallet, bytes calldata)`.

use crate::error::{Error, Result};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall, SolValue};
use serde::{Deserialize, Serialize};

sol! {
    /// Safe owner manager: replace `oldOwner` (preceded by `prevOwner` in
    /// the owner linked list) with `newOwner`.
    function swapOwner(address prevOwner, address oldOwner, address newOwner);
}

/// Selector of `swapOwner(address,address,address)`, configured as the
/// module's allowed recovery call.
pub const SWAP_OWNER_SELECTOR: [u8; 4] = swapOwnerCall::SELECTOR;

/// Owner replacement performed by a completed recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSwap {
    /// Owner preceding `old_owner` in the Safe owner list (sentinel `0x…01` when first)
    pub prev_owner: Address,
    /// Lost owner key
    pub old_owner: Address,
    /// Replacement owner key
    pub new_owner: Address,
}

impl OwnerSwap {
    /// Describe a swap
    #[must_use]
    pub fn new(prev_owner: Address, old_owner: Address, new_owner: Address) -> Self {
        Self {
            prev_owner,
            old_owner,
            new_owner,
        }
    }

    /// `swapOwner` calldata against the wallet
    #[must_use]
    pub fn calldata(&self) -> Bytes {
        swapOwnerCall {
            prevOwner: self.prev_owner,
            oldOwner: self.old_owner,
            newOwner: self.new_owner,
        }
        .abi_encode()
        .into()
    }

    /// `abi.encode(wallet, calldata)` as sent to `/completeRequest`
    #[must_use]
    pub fn complete_calldata(&self, wallet: Address) -> Bytes {
        (wallet, self.calldata()).abi_encode_params().into()
    }

    /// Inverse of [`OwnerSwap::complete_calldata`]
    pub fn decode_complete_calldata(data: &[u8]) -> Result<(Address, Self)> {
        let (wallet, inner) = <(Address, Bytes)>::abi_decode_params(data, true)
            .map_err(|e| Error::Validation(format!("complete calldata: {}", e)))?;
        let call = swapOwnerCall::abi_decode(&inner, true)
            .map_err(|e| Error::Validation(format!("swapOwner calldata: {}", e)))?;
        Ok((
            wallet,
            Self::new(call.prevOwner, call.oldOwner, call.newOwner),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_swap_owner_selector() {
        // keccak256("swapOwner(address,address,address)")[..4]
        assert_eq!(SWAP_OWNER_SELECTOR, [0xe3, 0x18, 0xb5, 0x2b]);
    }

    #[test]
    fn test_complete_calldata_layout() {
        let wallet = address!("1111111111111111111111111111111111111111");
        let swap = OwnerSwap::new(
            address!("0000000000000000000000000000000000000001"),
            address!("2222222222222222222222222222222222222222"),
            address!("3333333333333333333333333333333333333333"),
        );

        let inner = swap.calldata();
        assert_eq!(inner.len(), 4 + 3 * 32);
        assert_eq!(&inner[..4], &SWAP_OWNER_SELECTOR);

        let outer = swap.complete_calldata(wallet);
        let (decoded_wallet, decoded) = OwnerSwap::decode_complete_calldata(&outer).unwrap();
        assert_eq!(decoded_wallet, wallet);
        assert_eq!(decoded, swap);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(OwnerSwap::decode_complete_calldata(&[0u8; 7]).is_err());
    }
}
