//! Facet Router - selector table with staged cut application

use std::collections::HashMap;
use std::sync::Arc;

use regulus_core::{Address, Selector};
use serde_json::Value;

use crate::error::{RouterError, RouterResult};
use crate::facet::{CallEnvelope, Facet, FacetAction, FacetCut, FacetInit};

/// Routing table: selector -> facet, plus per-facet selector lists
struct FacetTable<S> {
    routes: HashMap<Selector, Arc<dyn Facet<S>>>,
    /// Installed facets in installation order
    facets: Vec<(Address, Vec<Selector>)>,
}

impl<S> Clone for FacetTable<S> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            facets: self.facets.clone(),
        }
    }
}

impl<S> FacetTable<S> {
    fn new() -> Self {
        Self {
            routes: HashMap::new(),
            facets: Vec::new(),
        }
    }

    fn apply(&mut self, cut: &FacetCut<S>) -> RouterResult<()> {
        if cut.selectors.is_empty() {
            return Err(RouterError::EmptySelectors);
        }

        match cut.action {
            FacetAction::Add => {
                let facet = cut
                    .facet
                    .as_ref()
                    .ok_or(RouterError::MissingFacet(cut.action))?;
                for &selector in &cut.selectors {
                    if self.routes.contains_key(&selector) {
                        return Err(RouterError::SelectorAlreadyRegistered(selector));
                    }
                    self.bind(selector, facet);
                }
            }
            FacetAction::Replace => {
                let facet = cut
                    .facet
                    .as_ref()
                    .ok_or(RouterError::MissingFacet(cut.action))?;
                for &selector in &cut.selectors {
                    self.unbind(selector)?;
                    self.bind(selector, facet);
                }
            }
            FacetAction::Remove => {
                for &selector in &cut.selectors {
                    self.unbind(selector)?;
                }
            }
        }

        Ok(())
    }

    fn bind(&mut self, selector: Selector, facet: &Arc<dyn Facet<S>>) {
        let address = facet.address();
        self.routes.insert(selector, Arc::clone(facet));
        match self.facets.iter_mut().find(|(addr, _)| *addr == address) {
            Some((_, selectors)) => selectors.push(selector),
            None => self.facets.push((address, vec![selector])),
        }
    }

    fn unbind(&mut self, selector: Selector) -> RouterResult<()> {
        let facet = self
            .routes
            .remove(&selector)
            .ok_or(RouterError::SelectorNotRegistered(selector))?;
        let address = facet.address();
        if let Some((_, selectors)) = self.facets.iter_mut().find(|(addr, _)| *addr == address) {
            selectors.retain(|s| *s != selector);
        }
        self.facets.retain(|(_, selectors)| !selectors.is_empty());
        Ok(())
    }
}

/// Dispatches selectors to installed facets
///
/// `S` is the storage every facet operates on. The router never owns it; the
/// caller lends it for each `install` and `dispatch`.
pub struct FacetRouter<S> {
    table: FacetTable<S>,
}

impl<S> Default for FacetRouter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FacetRouter<S> {
    /// Create an empty router
    pub fn new() -> Self {
        Self {
            table: FacetTable::new(),
        }
    }

    /// Apply a cut batch, then run the optional initializer
    ///
    /// Every cut is validated against a staged copy of the table. If any cut
    /// or the initializer fails, the table is left exactly as it was.
    pub fn install(
        &mut self,
        storage: &mut S,
        envelope: &CallEnvelope,
        cuts: Vec<FacetCut<S>>,
        init: Option<FacetInit<S>>,
    ) -> RouterResult<()> {
        let mut staged = self.table.clone();
        for cut in &cuts {
            staged.apply(cut)?;
        }

        let previous = std::mem::replace(&mut self.table, staged);

        if let Some(init) = init {
            if let Err(e) = init.facet.initialize(storage, envelope, init.data) {
                tracing::error!(
                    facet = %init.facet.address(),
                    name = init.facet.name(),
                    error = %e,
                    "Facet initializer failed, rolling back cut"
                );
                self.table = previous;
                return Err(RouterError::from_facet(e));
            }
        }

        for cut in &cuts {
            tracing::info!(
                action = %cut.action,
                facet = ?cut.facet.as_ref().map(|f| f.address()),
                selectors = cut.selectors.len(),
                "Facet cut applied"
            );
        }

        Ok(())
    }

    /// Route a call to the facet registered for `selector`
    pub fn dispatch(
        &self,
        storage: &mut S,
        envelope: &CallEnvelope,
        selector: Selector,
        payload: Value,
    ) -> RouterResult<Value> {
        let facet = self
            .table
            .routes
            .get(&selector)
            .ok_or(RouterError::SelectorNotRegistered(selector))?;

        tracing::debug!(
            selector = %selector,
            facet = facet.name(),
            caller = %envelope.caller,
            "Dispatching"
        );

        facet
            .call(storage, envelope, selector, payload)
            .map_err(RouterError::Facet)
    }

    /// Facet currently handling `selector`
    pub fn facet_address(&self, selector: Selector) -> Option<Address> {
        self.table.routes.get(&selector).map(|facet| facet.address())
    }

    /// Selectors routed to `facet`, in binding order
    pub fn selectors_of(&self, facet: Address) -> Vec<Selector> {
        self.table
            .facets
            .iter()
            .find(|(addr, _)| *addr == facet)
            .map(|(_, selectors)| selectors.clone())
            .unwrap_or_default()
    }

    /// Installed facets in installation order
    pub fn facet_addresses(&self) -> Vec<Address> {
        self.table.facets.iter().map(|(addr, _)| *addr).collect()
    }

    pub fn is_registered(&self, selector: Selector) -> bool {
        self.table.routes.contains_key(&selector)
    }
}
