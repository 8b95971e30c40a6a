//! Regulus Core - Shared domain types
//!
//! This crate contains the vocabulary every other Regulus crate speaks:
//! - `Address`, `Selector`, `Topic`, `ContextKey`: fixed-width identifiers
//! - `OperationContext`: the record of one in-flight asset operation
//! - `AccessControl`: role membership shared by an asset and its modules
//! - `Initializable`: two-phase initialization flag
//! - `Clock`: injectable time source

pub mod bytes;

pub mod access;
pub mod address;
pub mod clock;
pub mod context;
pub mod error;
pub mod init;
pub mod selector;
pub mod topic;

pub use access::{AccessControl, AccessHandle, Role};
pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::OperationContext;
pub use error::{AccessError, InitError, ParseError};
pub use init::Initializable;
pub use selector::{hooks, AssetOperation, Selector};
pub use topic::{ContextKey, Topic, TransferParty};
