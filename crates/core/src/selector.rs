//! Selector - 4-byte operation identifier
//!
//! A selector names one logical operation. It is the first four bytes of the
//! SHA-256 of the operation signature, e.g. `transfer(address,uint256)`.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::bytes::digest;

crate::fixed_bytes!(
    /// 4-byte operation selector
    Selector,
    4
);

impl Selector {
    /// Selector for an operation signature
    pub fn from_signature(signature: &str) -> Self {
        let hash = digest(signature.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }
}

/// Base operations compiled into every asset
///
/// These are never routed through the facet table; each maps to a fixed
/// selector so compliance modules can key topics on them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetOperation {
    Mint,
    Burn,
    Transfer,
    TransferFrom,
    ForcedTransfer,
    Recovery,
}

impl AssetOperation {
    /// Operation signature the selector is derived from
    pub fn signature(&self) -> &'static str {
        match self {
            AssetOperation::Mint => "mint(address,uint256)",
            AssetOperation::Burn => "burn(address,uint256)",
            AssetOperation::Transfer => "transfer(address,uint256)",
            AssetOperation::TransferFrom => "transferFrom(address,address,uint256)",
            AssetOperation::ForcedTransfer => "forcedTransfer(address,address,uint256)",
            AssetOperation::Recovery => "recovery(address,address)",
        }
    }

    /// Selector of this operation
    pub fn selector(&self) -> Selector {
        Selector::from_signature(self.signature())
    }
}

/// Selectors of the compliance hooks the asset dispatches through its router
pub mod hooks {
    use super::Selector;

    pub const IS_KYCED_SIGNATURE: &str = "isKYCed((bytes4,address,address,uint256,uint256,address,bytes))";
    pub const CAN_TRANSFER_SIGNATURE: &str =
        "canTransfer((bytes4,address,address,uint256,uint256,address,bytes))";
    pub const TRANSFERRED_SIGNATURE: &str =
        "transferred((bytes4,address,address,uint256,uint256,address,bytes))";

    pub fn is_kyced() -> Selector {
        Selector::from_signature(IS_KYCED_SIGNATURE)
    }

    pub fn can_transfer() -> Selector {
        Selector::from_signature(CAN_TRANSFER_SIGNATURE)
    }

    pub fn transferred() -> Selector {
        Selector::from_signature(TRANSFERRED_SIGNATURE)
    }
}
