//! Regulus Asset - Compliance-gated tokens
//!
//! An asset owns a facet router and an [`AssetStorage`]. Every state
//! change runs through [`AssetCore::execute`], which asks the KYC and
//! regulatory layers for a verdict before touching the ledger and notifies
//! the regulatory layer afterwards.
//!
//! - [`TokenF`]: fungible accounting
//! - [`NftF`]: non-fungible accounting

pub mod config;
pub mod error;
pub mod facets;
pub mod fungible;
pub mod ledger;
pub mod nft;
pub mod pipeline;
pub mod storage;

pub use config::{AssetConfig, AssetKind, OperationRoles};
pub use error::{AssetError, AssetResult, LedgerError};
pub use facets::{KycComplianceFacet, RegulatoryComplianceFacet};
pub use fungible::TokenF;
pub use ledger::{FungibleLedger, Journaled, NonFungibleLedger};
pub use nft::NftF;
pub use pipeline::AssetCore;
pub use storage::AssetStorage;
