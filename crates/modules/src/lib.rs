//! Regulus Modules - Bundled compliance modules
//!
//! - [`SimpleKycModule`]: soulbound attestation checks (KYC)
//! - [`TransferLimitsModule`]: per-operation amount bounds (regulatory)
//! - [`TransferRateLimitModule`]: fixed-window transfer counting (regulatory)
//!
//! Every module is created unbound to any policy, initialized once with
//! `init`, then given topics per context key by an agent of its asset.

pub mod claims;
pub mod error;
pub mod kyc;
pub mod limits;
pub mod rate_limit;
pub mod topics;

pub use claims::{ClaimSource, SoulboundRegistry};
pub use error::{ClaimError, ClaimResult};
pub use kyc::SimpleKycModule;
pub use limits::TransferLimitsModule;
pub use rate_limit::{PeriodCounter, TransferRateLimitModule};
