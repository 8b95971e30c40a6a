//! Module Registry - ordered set of modules keyed by address

use std::collections::HashSet;
use std::sync::Arc;

use regulus_core::{Address, OperationContext};

use crate::error::{ComplianceError, ComplianceResult};
use crate::traits::Module;

/// Ordered set of module handles
///
/// Modules are consulted in insertion order. Batches are validated in full
/// before the registry changes, so a failing batch leaves it untouched.
pub struct ModuleRegistry<M: Module + ?Sized> {
    modules: Vec<Arc<M>>,
}

impl<M: Module + ?Sized> Default for ModuleRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Module + ?Sized> ModuleRegistry<M> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn contains(&self, address: Address) -> bool {
        self.modules.iter().any(|m| m.address() == address)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module addresses in consultation order
    pub fn addresses(&self) -> Vec<Address> {
        self.modules.iter().map(|m| m.address()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<M>> {
        self.modules.iter()
    }

    /// Append `modules`; none may already be registered
    pub fn add_all(&mut self, modules: Vec<Arc<M>>) -> ComplianceResult<()> {
        let mut seen: HashSet<Address> = self.modules.iter().map(|m| m.address()).collect();
        for module in &modules {
            if !seen.insert(module.address()) {
                return Err(ComplianceError::ModuleAlreadyExists(module.address()));
            }
        }

        for module in &modules {
            tracing::info!(module = %module.address(), name = module.name(), "Module added");
        }
        self.modules.extend(modules);
        Ok(())
    }

    /// Remove `addresses`; all must be registered
    pub fn remove_all(&mut self, addresses: &[Address]) -> ComplianceResult<()> {
        let mut pending: HashSet<Address> = self.modules.iter().map(|m| m.address()).collect();
        for address in addresses {
            if !pending.remove(address) {
                return Err(ComplianceError::NoSuchModule(*address));
            }
        }

        self.modules.retain(|m| pending.contains(&m.address()));
        for address in addresses {
            tracing::info!(module = %address, "Module removed");
        }
        Ok(())
    }

    /// AND of every module's verdict, stopping at the first denial
    ///
    /// A module error is propagated, never turned into a denial.
    pub fn all_pass(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        for module in &self.modules {
            match module.evaluate(ctx) {
                Ok(true) => {
                    tracing::debug!(
                        module = %module.address(),
                        name = module.name(),
                        selector = %ctx.selector,
                        "Module passed"
                    );
                }
                Ok(false) => {
                    tracing::warn!(
                        module = %module.address(),
                        name = module.name(),
                        selector = %ctx.selector,
                        from = %ctx.from,
                        to = %ctx.to,
                        "Module denied operation"
                    );
                    return Ok(false);
                }
                Err(e) => {
                    tracing::error!(
                        module = %module.address(),
                        name = module.name(),
                        error = %e,
                        "Module failed"
                    );
                    return Err(e);
                }
            }
        }

        Ok(true)
    }
}
