//! Claim source errors

use regulus_compliance::ComplianceError;
use regulus_core::Address;
use thiserror::Error;

/// Errors from the soulbound claim registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("Token already minted: {0}")]
    TokenAlreadyMinted(u64),

    #[error("No such token: {0}")]
    NoSuchToken(u64),

    #[error("Invalid holder: {0}")]
    InvalidHolder(Address),
}

/// Result type for claim registry operations
pub type ClaimResult<T> = Result<T, ClaimError>;

impl From<ClaimError> for ComplianceError {
    fn from(err: ClaimError) -> Self {
        ComplianceError::Claims(err.to_string())
    }
}
