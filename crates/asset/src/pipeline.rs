//! Asset core - storage, facet router and the gated operation pipeline
//!
//! ```text
//! operation
//!     │
//!     ├─ role check (where the operation is privileged)
//!     ├─ dispatch isKYCed      false → NotKyced       failure → IsKycedReverted
//!     ├─ dispatch canTransfer  false → CannotTransfer failure → CanTransferReverted
//!     ├─ ledger change
//!     └─ dispatch transferred  failure → TransferredReverted (ledger and modules restored)
//! ```

use std::sync::Arc;

use regulus_compliance::{KycModule, RegulatoryModule};
use regulus_core::{hooks, AccessControl, AccessHandle, Address, OperationContext, Role, Selector};
use regulus_diamond::{CallEnvelope, Facet, FacetCut, FacetInit, FacetRouter, RouterError};
use serde_json::Value;

use crate::config::{AssetConfig, OperationRoles};
use crate::error::{AssetError, AssetResult, LedgerError};
use crate::facets::{KycComplianceFacet, RegulatoryComplianceFacet};
use crate::ledger::Journaled;
use crate::storage::AssetStorage;

/// State and behaviour shared by fungible and non-fungible assets
pub struct AssetCore {
    name: String,
    symbol: String,
    owner: Address,
    storage: AssetStorage,
    router: FacetRouter<AssetStorage>,
}

impl AssetCore {
    /// Deploy an asset at `this`, owned by `owner`
    ///
    /// The owner receives `DEFAULT_ADMIN` and `AGENT`. Both compliance hook
    /// facets are installed and initialized.
    pub fn new(this: Address, owner: Address, config: &AssetConfig) -> AssetResult<Self> {
        config.validate()?;

        let access = AccessControl::new(owner).into_handle();
        let storage = AssetStorage::new(this, access, config.operation_roles());
        let mut core = Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            owner,
            storage,
            router: FacetRouter::new(),
        };

        let envelope = CallEnvelope::from_caller(owner);
        let kyc: Arc<dyn Facet<AssetStorage>> = Arc::new(KycComplianceFacet);
        let regulatory: Arc<dyn Facet<AssetStorage>> = Arc::new(RegulatoryComplianceFacet);

        core.router.install(
            &mut core.storage,
            &envelope,
            vec![FacetCut::add(Arc::clone(&kyc), KycComplianceFacet::selectors())],
            Some(FacetInit::new(kyc, Value::Null)),
        )?;
        core.router.install(
            &mut core.storage,
            &envelope,
            vec![FacetCut::add(
                Arc::clone(&regulatory),
                RegulatoryComplianceFacet::selectors(),
            )],
            Some(FacetInit::new(regulatory, Value::Null)),
        )?;

        tracing::info!(
            asset = %this,
            owner = %owner,
            name = %core.name,
            symbol = %core.symbol,
            "Asset deployed"
        );
        Ok(core)
    }

    // === Getters ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The asset's own address
    pub fn this(&self) -> Address {
        self.storage.this
    }

    /// Shared access control handle (for binding modules)
    pub fn access(&self) -> AccessHandle {
        Arc::clone(&self.storage.access)
    }

    pub fn roles(&self) -> OperationRoles {
        self.storage.roles
    }

    pub fn storage(&self) -> &AssetStorage {
        &self.storage
    }

    pub fn router(&self) -> &FacetRouter<AssetStorage> {
        &self.router
    }

    pub fn kyc_modules(&self) -> Vec<Address> {
        self.storage.kyc.modules()
    }

    pub fn regulatory_modules(&self) -> Vec<Address> {
        self.storage.regulatory.modules()
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.storage.access.read().has_role(role, account)
    }

    // === Administration ===

    /// Require `role` (or `AGENT`) on `caller`
    pub fn require_role(&self, role: Role, caller: Address) -> AssetResult<()> {
        Ok(self.storage.access.read().check_role(role, caller)?)
    }

    pub fn grant_role(&mut self, caller: Address, role: Role, account: Address) -> AssetResult<bool> {
        Ok(self.storage.access.write().grant_role(caller, role, account)?)
    }

    pub fn revoke_role(&mut self, caller: Address, role: Role, account: Address) -> AssetResult<bool> {
        Ok(self.storage.access.write().revoke_role(caller, role, account)?)
    }

    /// Apply a facet cut; requires the diamond-cut role
    pub fn diamond_cut(
        &mut self,
        caller: Address,
        cuts: Vec<FacetCut<AssetStorage>>,
        init: Option<FacetInit<AssetStorage>>,
    ) -> AssetResult<()> {
        self.require_role(self.storage.roles.diamond_cut, caller)?;
        self.router
            .install(&mut self.storage, &CallEnvelope::from_caller(caller), cuts, init)?;
        Ok(())
    }

    /// Fallback: route an arbitrary selector through the facet table
    pub fn call(&mut self, caller: Address, selector: Selector, payload: Value) -> AssetResult<Value> {
        Ok(self
            .router
            .dispatch(&mut self.storage, &CallEnvelope::from_caller(caller), selector, payload)?)
    }

    pub fn add_kyc_modules(
        &mut self,
        caller: Address,
        modules: Vec<Arc<dyn KycModule>>,
    ) -> AssetResult<()> {
        let access = Arc::clone(&self.storage.access);
        let guard = access.read();
        Ok(self.storage.kyc.add_modules(&guard, caller, modules)?)
    }

    pub fn remove_kyc_modules(&mut self, caller: Address, modules: &[Address]) -> AssetResult<()> {
        let access = Arc::clone(&self.storage.access);
        let guard = access.read();
        Ok(self.storage.kyc.remove_modules(&guard, caller, modules)?)
    }

    pub fn add_regulatory_modules(
        &mut self,
        caller: Address,
        modules: Vec<Arc<dyn RegulatoryModule>>,
    ) -> AssetResult<()> {
        let access = Arc::clone(&self.storage.access);
        let guard = access.read();
        Ok(self.storage.regulatory.add_modules(&guard, caller, modules)?)
    }

    pub fn remove_regulatory_modules(
        &mut self,
        caller: Address,
        modules: &[Address],
    ) -> AssetResult<()> {
        let access = Arc::clone(&self.storage.access);
        let guard = access.read();
        Ok(self.storage.regulatory.remove_modules(&guard, caller, modules)?)
    }

    // === Compliance hooks ===

    /// Dispatch `isKYCed` for `ctx`
    pub fn is_kyced(&mut self, ctx: &OperationContext) -> AssetResult<bool> {
        let envelope = CallEnvelope::from_caller(ctx.operator);
        self.query(hooks::is_kyced(), &envelope, ctx)
            .map_err(AssetError::IsKycedReverted)
    }

    /// Dispatch `canTransfer` for `ctx`
    pub fn can_transfer(&mut self, ctx: &OperationContext) -> AssetResult<bool> {
        let envelope = CallEnvelope::from_caller(ctx.operator);
        self.query(hooks::can_transfer(), &envelope, ctx)
            .map_err(AssetError::CanTransferReverted)
    }

    /// Dispatch `transferred` for `ctx`, with the asset itself as caller
    pub fn transferred(&mut self, ctx: &OperationContext) -> AssetResult<()> {
        let envelope = CallEnvelope::from_caller(self.storage.this);
        let payload = serde_json::to_value(ctx)?;
        self.router
            .dispatch(&mut self.storage, &envelope, hooks::transferred(), payload)
            .map_err(AssetError::TransferredReverted)?;
        Ok(())
    }

    fn query(
        &mut self,
        selector: Selector,
        envelope: &CallEnvelope,
        ctx: &OperationContext,
    ) -> Result<bool, RouterError> {
        let payload = serde_json::to_value(ctx).map_err(|e| RouterError::Facet(Box::new(e)))?;
        let result = self
            .router
            .dispatch(&mut self.storage, envelope, selector, payload)?;
        result.as_bool().ok_or_else(|| {
            RouterError::Facet(format!("{selector} returned non-boolean {result}").into())
        })
    }

    /// Run one operation through the gated pipeline
    ///
    /// `apply` mutates `ledger` under a journal. If `apply` fails part way or
    /// the post-commit notification fails, every entry it wrote is restored.
    pub fn execute<L, T>(
        &mut self,
        ctx: OperationContext,
        ledger: &mut L,
        apply: impl FnOnce(&mut L) -> Result<T, LedgerError>,
    ) -> AssetResult<T>
    where
        L: Journaled,
    {
        if !self.is_kyced(&ctx)? {
            tracing::warn!(selector = %ctx.selector, from = %ctx.from, to = %ctx.to, "Not KYCed");
            return Err(AssetError::NotKyced);
        }
        if !self.can_transfer(&ctx)? {
            tracing::warn!(selector = %ctx.selector, from = %ctx.from, to = %ctx.to, "Cannot transfer");
            return Err(AssetError::CannotTransfer);
        }

        ledger.begin();
        let output = match apply(ledger) {
            Ok(output) => output,
            Err(e) => {
                ledger.rollback();
                return Err(e.into());
            }
        };

        if let Err(e) = self.transferred(&ctx) {
            tracing::error!(selector = %ctx.selector, error = %e, "Post-commit notification failed, rolling back");
            ledger.rollback();
            return Err(e);
        }
        ledger.commit();

        tracing::debug!(
            selector = %ctx.selector,
            from = %ctx.from,
            to = %ctx.to,
            amount = %ctx.amount,
            token_id = ctx.token_id,
            "Operation committed"
        );
        Ok(output)
    }
}
