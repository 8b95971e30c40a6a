//! Regulus CLI - scenario runner
//!
//! Deploys a compliance-gated asset from an [`regulus_asset::AssetConfig`],
//! installs the bundled modules and replays a [`Scenario`] against it.

pub mod commands;
pub mod context;
pub mod scenario;

pub use context::AppContext;
pub use scenario::{ModuleKind, Scenario, Step};
