//! Compliance aggregators - combine module verdicts for an asset
//!
//! ```text
//! asset ──► is_kyced(ctx)     ──► KycCompliance        ──► [KycModule...]
//! asset ──► can_transfer(ctx) ──► RegulatoryCompliance ──► [RegulatoryModule...]
//! asset ──► transferred(ctx)  ──► RegulatoryCompliance ──► notify_completed (staged, then applied)
//! ```

use std::sync::Arc;

use regulus_core::{AccessControl, Address, OperationContext, Role};

use crate::error::{ComplianceError, ComplianceResult};
use crate::registry::ModuleRegistry;
use crate::traits::{KycModule, RegulatoryModule};

/// Identity / eligibility aggregator
pub struct KycCompliance {
    registry: ModuleRegistry<dyn KycModule>,
    role: Role,
}

impl Default for KycCompliance {
    fn default() -> Self {
        Self::new()
    }
}

impl KycCompliance {
    /// Aggregator administered by `KYC_COMPLIANCE_ROLE`
    pub fn new() -> Self {
        Self::with_role(Role::kyc_compliance())
    }

    pub fn with_role(role: Role) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            role,
        }
    }

    /// Role required to add or remove modules
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn add_modules(
        &mut self,
        access: &AccessControl,
        caller: Address,
        modules: Vec<Arc<dyn KycModule>>,
    ) -> ComplianceResult<()> {
        access.check_role(self.role, caller)?;
        self.registry.add_all(modules)
    }

    pub fn remove_modules(
        &mut self,
        access: &AccessControl,
        caller: Address,
        modules: &[Address],
    ) -> ComplianceResult<()> {
        access.check_role(self.role, caller)?;
        self.registry.remove_all(modules)
    }

    /// True iff every KYC module passes (vacuously true when empty)
    pub fn is_kyced(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.registry.all_pass(ctx)
    }

    pub fn modules(&self) -> Vec<Address> {
        self.registry.addresses()
    }

    pub fn module_count(&self) -> usize {
        self.registry.len()
    }
}

/// Legality aggregator
pub struct RegulatoryCompliance {
    registry: ModuleRegistry<dyn RegulatoryModule>,
    role: Role,
}

impl Default for RegulatoryCompliance {
    fn default() -> Self {
        Self::new()
    }
}

impl RegulatoryCompliance {
    /// Aggregator administered by `REGULATORY_COMPLIANCE_ROLE`
    pub fn new() -> Self {
        Self::with_role(Role::regulatory_compliance())
    }

    pub fn with_role(role: Role) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            role,
        }
    }

    /// Role required to add or remove modules
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn add_modules(
        &mut self,
        access: &AccessControl,
        caller: Address,
        modules: Vec<Arc<dyn RegulatoryModule>>,
    ) -> ComplianceResult<()> {
        access.check_role(self.role, caller)?;
        self.registry.add_all(modules)
    }

    pub fn remove_modules(
        &mut self,
        access: &AccessControl,
        caller: Address,
        modules: &[Address],
    ) -> ComplianceResult<()> {
        access.check_role(self.role, caller)?;
        self.registry.remove_all(modules)
    }

    /// True iff every regulatory module passes (vacuously true when empty)
    pub fn can_transfer(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.registry.all_pass(ctx)
    }

    /// Notify every module of a committed operation
    ///
    /// `this` is the asset owning the aggregator; only it may report.
    /// Module updates are staged first and applied only when every module
    /// accepted the notification, so a failure leaves all modules untouched.
    pub fn transferred(
        &self,
        this: Address,
        caller: Address,
        ctx: &OperationContext,
    ) -> ComplianceResult<()> {
        if caller != this {
            return Err(ComplianceError::SenderNotThisContract(caller));
        }

        let mut staged = Vec::with_capacity(self.registry.len());
        for module in self.registry.iter() {
            let update = module.notify_completed(this, ctx).inspect_err(|e| {
                tracing::error!(
                    module = %module.address(),
                    name = module.name(),
                    error = %e,
                    discarded = staged.len(),
                    "Module notification failed"
                );
            })?;
            staged.push(update);
        }

        for update in staged {
            update.apply();
        }
        Ok(())
    }

    pub fn modules(&self) -> Vec<Address> {
        self.registry.addresses()
    }

    pub fn module_count(&self) -> usize {
        self.registry.len()
    }
}
