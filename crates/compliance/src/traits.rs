//! Module traits - interfaces every policy module implements

use regulus_core::{Address, ContextKey, OperationContext};

use crate::error::{ComplianceError, ComplianceResult};

/// A pluggable policy unit
///
/// `evaluate` returns `Ok(false)` for a policy denial. `Err` means the module
/// itself failed and always aborts the enclosing operation.
pub trait Module: Send + Sync {
    /// Module identity inside an aggregator
    fn address(&self) -> Address;

    /// Module name for logging/debugging
    fn name(&self) -> &str;

    /// Asset this module is bound to
    fn asset(&self) -> Address;

    /// Key into the module's topic table for `ctx`
    fn context_key(&self, ctx: &OperationContext) -> ContextKey {
        ContextKey::for_selector(ctx.selector)
    }

    /// Verdict for one operation
    fn evaluate(&self, ctx: &OperationContext) -> ComplianceResult<bool>;
}

/// Identity / eligibility module consulted by `is_kyced`
pub trait KycModule: Module {}

/// Module state change staged by a post-commit notification
///
/// Nothing changes until [`PendingUpdate::apply`]; dropping the update
/// discards it.
#[must_use]
pub struct PendingUpdate<'a> {
    apply: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> PendingUpdate<'a> {
    /// Update with no effect
    pub fn none() -> Self {
        Self { apply: None }
    }

    pub fn new(apply: impl FnOnce() + 'a) -> Self {
        Self {
            apply: Some(Box::new(apply)),
        }
    }

    pub fn is_none(&self) -> bool {
        self.apply.is_none()
    }

    pub fn apply(self) {
        if let Some(apply) = self.apply {
            apply();
        }
    }
}

impl std::fmt::Debug for PendingUpdate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpdate")
            .field("staged", &self.apply.is_some())
            .finish()
    }
}

/// Legality module consulted by `can_transfer` and notified after commit
pub trait RegulatoryModule: Module {
    /// Post-commit notification; only the bound asset may call it
    ///
    /// The returned update is applied once every module of the aggregator
    /// has accepted the notification.
    fn notify_completed(
        &self,
        caller: Address,
        ctx: &OperationContext,
    ) -> ComplianceResult<PendingUpdate<'_>> {
        if caller != self.asset() {
            return Err(ComplianceError::SenderNotAsset(caller));
        }
        self.on_completed(ctx)
    }

    /// Bookkeeping after a committed operation
    fn on_completed(&self, _ctx: &OperationContext) -> ComplianceResult<PendingUpdate<'_>> {
        Ok(PendingUpdate::none())
    }
}
