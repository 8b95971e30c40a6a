//! Regulus Compliance - policy module framework
//!
//! Two aggregators gate every asset operation:
//!
//! ```text
//! Operation
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ KycCompliance::is_kyced     │ ← identity / eligibility modules
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ RegulatoryCompliance        │ ← limits, rate limits, jurisdictions
//! │   ::can_transfer            │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ LEDGER COMMIT               │
//! └─────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────┐
//! │ RegulatoryCompliance        │ ← modules update their counters
//! │   ::transferred             │
//! └─────────────────────────────┘
//! ```
//!
//! Each module keeps a table of topics (named sub-rules) per context key and
//! a handler per topic; see [`ModuleBase`].

pub mod aggregator;
pub mod base;
pub mod error;
pub mod registry;
pub mod traits;

pub use aggregator::{KycCompliance, RegulatoryCompliance};
pub use base::{AssetBinding, Handler, ModuleBase};
pub use error::{ComplianceError, ComplianceResult};
pub use registry::ModuleRegistry;
pub use traits::{KycModule, Module, PendingUpdate, RegulatoryModule};
