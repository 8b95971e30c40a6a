//! Compliance errors

use regulus_core::{AccessError, Address, InitError, Topic};
use thiserror::Error;

/// Errors from compliance modules and aggregators
///
/// A policy denial is never an error: it is an `Ok(false)` verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("Module already exists: {0}")]
    ModuleAlreadyExists(Address),

    #[error("No such module: {0}")]
    NoSuchModule(Address),

    #[error("Topic already exists: {0}")]
    TopicAlreadyExists(Topic),

    #[error("No such topic: {0}")]
    NoSuchTopic(Topic),

    #[error("Handler not set for topic {0}")]
    HandlerNotSet(Topic),

    #[error("Sender is not the bound asset: {0}")]
    SenderNotAsset(Address),

    #[error("Sender is not this contract: {0}")]
    SenderNotThisContract(Address),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Claim source error: {0}")]
    Claims(String),
}

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;

impl ComplianceError {
    /// Create an invalid-parameter error
    pub fn invalid(msg: impl Into<String>) -> Self {
        ComplianceError::InvalidParameter(msg.into())
    }

    /// Check if this is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ComplianceError::Unauthorized(_))
    }
}
