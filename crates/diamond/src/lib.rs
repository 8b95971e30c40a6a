//! Regulus Diamond - Facet router
//!
//! One logical asset serves calls through a table of installed facets keyed
//! by selector. Facets can be added, replaced and removed at runtime with
//! [`FacetRouter::install`]; a cut batch applies entirely or not at all.
//!
//! # Flow
//!
//! ```text
//! caller ──► dispatch(selector) ──► FacetRouter ──► Facet::call(storage, ...)
//! ```

pub mod error;
pub mod facet;
pub mod router;

pub use error::{FacetError, RouterError, RouterResult};
pub use facet::{CallEnvelope, Facet, FacetAction, FacetCut, FacetInit};
pub use router::FacetRouter;
