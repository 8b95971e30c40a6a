//! Facet trait and cut descriptors

use std::fmt;
use std::sync::Arc;

use regulus_core::{Address, Selector};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;

use crate::error::FacetError;

/// Who is calling and what value travels with the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub caller: Address,
    pub value: Decimal,
}

impl CallEnvelope {
    /// Envelope with no attached value
    pub fn from_caller(caller: Address) -> Self {
        Self {
            caller,
            value: Decimal::ZERO,
        }
    }
}

/// Replaceable handler installed in a [`crate::FacetRouter`]
///
/// `S` is the storage shared by every facet of one router. A facet owns no
/// routing state; whatever it persists lives in `S`.
pub trait Facet<S>: Send + Sync {
    /// Identity used by the router's loupe
    fn address(&self) -> Address;

    /// Facet name (for logging)
    fn name(&self) -> &str;

    /// Handle a routed call
    fn call(
        &self,
        storage: &mut S,
        envelope: &CallEnvelope,
        selector: Selector,
        payload: Value,
    ) -> Result<Value, FacetError>;

    /// One-shot initializer run by [`crate::FacetRouter::install`]
    fn initialize(
        &self,
        _storage: &mut S,
        _envelope: &CallEnvelope,
        _data: Value,
    ) -> Result<(), FacetError> {
        Ok(())
    }
}

/// What a cut does with its selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FacetAction {
    Add,
    Replace,
    Remove,
}

/// One entry of a cut batch
pub struct FacetCut<S> {
    /// Target facet (ignored for `Remove`)
    pub facet: Option<Arc<dyn Facet<S>>>,
    pub action: FacetAction,
    pub selectors: Vec<Selector>,
}

impl<S> FacetCut<S> {
    pub fn add(facet: Arc<dyn Facet<S>>, selectors: Vec<Selector>) -> Self {
        Self {
            facet: Some(facet),
            action: FacetAction::Add,
            selectors,
        }
    }

    pub fn replace(facet: Arc<dyn Facet<S>>, selectors: Vec<Selector>) -> Self {
        Self {
            facet: Some(facet),
            action: FacetAction::Replace,
            selectors,
        }
    }

    pub fn remove(selectors: Vec<Selector>) -> Self {
        Self {
            facet: None,
            action: FacetAction::Remove,
            selectors,
        }
    }
}

impl<S> fmt::Debug for FacetCut<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetCut")
            .field("facet", &self.facet.as_ref().map(|facet| facet.address()))
            .field("action", &self.action)
            .field("selectors", &self.selectors)
            .finish()
    }
}

/// Initializer to run once a cut batch is applied
pub struct FacetInit<S> {
    pub facet: Arc<dyn Facet<S>>,
    pub data: Value,
}

impl<S> FacetInit<S> {
    pub fn new(facet: Arc<dyn Facet<S>>, data: Value) -> Self {
        Self { facet, data }
    }
}

impl<S> fmt::Debug for FacetInit<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetInit")
            .field("facet", &self.facet.address())
            .field("data", &self.data)
            .finish()
    }
}
