//! Transfer limits module - per-operation amount bounds for fungible assets

use parking_lot::RwLock;
use regulus_compliance::{
    AssetBinding, ComplianceError, ComplianceResult, Module, ModuleBase, RegulatoryModule,
};
use regulus_core::{Address, OperationContext};
use rust_decimal::Decimal;

use crate::topics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Limits {
    min: Decimal,
    max: Decimal,
}

/// Regulatory module bounding the amount of a single operation
///
/// Topics: `MIN_TRANSFER_LIMIT` (`amount >= min`) and `MAX_TRANSFER_LIMIT`
/// (`amount <= max`).
pub struct TransferLimitsModule {
    base: ModuleBase<TransferLimitsModule>,
    limits: RwLock<Limits>,
}

impl TransferLimitsModule {
    pub fn new(address: Address, binding: AssetBinding) -> Self {
        Self {
            base: ModuleBase::new(address, "TransferLimits", binding),
            limits: RwLock::new(Limits {
                min: Decimal::ZERO,
                max: Decimal::MAX,
            }),
        }
    }

    pub fn base(&self) -> &ModuleBase<TransferLimitsModule> {
        &self.base
    }

    /// One-shot initializer
    pub fn init(&self, min: Decimal, max: Decimal) -> ComplianceResult<()> {
        self.base.initializer(|| self.init_unchained(min, max))
    }

    /// Per-layer initializer; only callable from [`TransferLimitsModule::init`]
    pub fn init_unchained(&self, min: Decimal, max: Decimal) -> ComplianceResult<()> {
        self.base.only_initializing()?;
        validate(min, max)?;
        *self.limits.write() = Limits { min, max };
        self.wire_handlers();
        Ok(())
    }

    fn wire_handlers(&self) {
        self.base
            .set_handler(topics::min_transfer_limit(), Self::check_min);
        self.base
            .set_handler(topics::max_transfer_limit(), Self::check_max);
    }

    /// Current `(min, max)`
    pub fn transfer_limits(&self) -> (Decimal, Decimal) {
        let limits = self.limits.read();
        (limits.min, limits.max)
    }

    pub fn set_min_transfer_limit(&self, caller: Address, min: Decimal) -> ComplianceResult<()> {
        self.base.only_agent(caller)?;
        let mut limits = self.limits.write();
        validate(min, limits.max)?;
        limits.min = min;
        tracing::info!(module = %self.base.address(), min = %min, "Minimum transfer limit set");
        Ok(())
    }

    pub fn set_max_transfer_limit(&self, caller: Address, max: Decimal) -> ComplianceResult<()> {
        self.base.only_agent(caller)?;
        let mut limits = self.limits.write();
        validate(limits.min, max)?;
        limits.max = max;
        tracing::info!(module = %self.base.address(), max = %max, "Maximum transfer limit set");
        Ok(())
    }

    fn check_min(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        Ok(ctx.amount >= self.limits.read().min)
    }

    fn check_max(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        Ok(ctx.amount <= self.limits.read().max)
    }
}

fn validate(min: Decimal, max: Decimal) -> ComplianceResult<()> {
    if min.is_sign_negative() {
        return Err(ComplianceError::invalid(format!(
            "minimum transfer limit {min} is negative"
        )));
    }
    if min > max {
        return Err(ComplianceError::invalid(format!(
            "minimum transfer limit {min} exceeds maximum {max}"
        )));
    }
    Ok(())
}

impl Module for TransferLimitsModule {
    fn address(&self) -> Address {
        self.base.address()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn asset(&self) -> Address {
        self.base.asset()
    }

    fn evaluate(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.base.evaluate(self, self.context_key(ctx), ctx)
    }
}

impl RegulatoryModule for TransferLimitsModule {}
