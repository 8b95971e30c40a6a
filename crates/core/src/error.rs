//! Core errors

use thiserror::Error;

use crate::access::Role;
use crate::address::Address;

/// Errors from parsing hex identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors from role checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Account {account} is missing role {role}")]
    Unauthorized { account: Address, role: Role },

    #[error("Account {account} is not an admin of role {role} (admin role: {admin})")]
    AdminRequired {
        account: Address,
        role: Role,
        admin: Role,
    },
}

/// Errors from one-shot initialization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Not initializing")]
    NotInitializing,
}
