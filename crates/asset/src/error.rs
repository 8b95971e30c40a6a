//! Asset error types

use regulus_compliance::ComplianceError;
use regulus_core::{AccessError, Address, InitError};
use regulus_diamond::RouterError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Token accounting errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {account}: have {balance}, need {required}")]
    InsufficientBalance {
        account: Address,
        balance: Decimal,
        required: Decimal,
    },

    #[error("Insufficient allowance of {spender} over {owner}: have {allowance}, need {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: Decimal,
        required: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Token already minted: {0}")]
    TokenAlreadyMinted(u64),

    #[error("No such token: {0}")]
    NoSuchToken(u64),

    #[error("{account} does not own token {token_id}")]
    NotOwner { account: Address, token_id: u64 },

    #[error("{spender} is not approved for token {token_id}")]
    NotApproved { spender: Address, token_id: u64 },

    #[error("Zero address not allowed")]
    ZeroAddress,
}

/// Asset operation errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("Not KYCed")]
    NotKyced,

    #[error("Cannot transfer")]
    CannotTransfer,

    #[error("isKYCed reverted: {0}")]
    IsKycedReverted(#[source] RouterError),

    #[error("canTransfer reverted: {0}")]
    CanTransferReverted(#[source] RouterError),

    #[error("transferred reverted: {0}")]
    TransferredReverted(#[source] RouterError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

impl AssetError {
    /// Compliance error raised inside a reverted hook, if any
    pub fn compliance_cause(&self) -> Option<&ComplianceError> {
        match self {
            AssetError::IsKycedReverted(e)
            | AssetError::CanTransferReverted(e)
            | AssetError::TransferredReverted(e)
            | AssetError::Router(e) => e.facet_error::<ComplianceError>(),
            AssetError::Compliance(e) => Some(e),
            _ => None,
        }
    }

    /// True for a policy denial (as opposed to a failure)
    pub fn is_denial(&self) -> bool {
        matches!(self, AssetError::NotKyced | AssetError::CannotTransfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_cause_through_router() {
        let inner = ComplianceError::SenderNotThisContract(Address::derive("x"));
        let err = AssetError::TransferredReverted(RouterError::Facet(Box::new(inner.clone())));
        assert_eq!(err.compliance_cause(), Some(&inner));
        assert!(!err.is_denial());
    }

    #[test]
    fn test_denials() {
        assert!(AssetError::NotKyced.is_denial());
        assert!(AssetError::CannotTransfer.is_denial());
        assert!(AssetError::NotKyced.compliance_cause().is_none());
    }

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::NoSuchToken(42);
        assert_eq!(err.to_string(), "No such token: 42");
    }
}
