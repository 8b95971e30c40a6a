//! Simple KYC module - soulbound attestation checks per party

use std::sync::Arc;

use parking_lot::RwLock;
use regulus_compliance::{
    AssetBinding, ComplianceError, ComplianceResult, KycModule, Module, ModuleBase,
};
use regulus_core::{Address, OperationContext, TransferParty};

use crate::claims::ClaimSource;
use crate::topics;

/// KYC module backed by a soulbound claim source
///
/// Topics: `HAS_SOUL_SENDER`, `HAS_SOUL_RECIPIENT`, `HAS_SOUL_OPERATOR`.
/// Each passes when the party holds at least one attestation.
pub struct SimpleKycModule {
    base: ModuleBase<SimpleKycModule>,
    claims: RwLock<Option<Arc<dyn ClaimSource>>>,
}

impl SimpleKycModule {
    pub fn new(address: Address, binding: AssetBinding) -> Self {
        Self {
            base: ModuleBase::new(address, "SimpleKyc", binding),
            claims: RwLock::new(None),
        }
    }

    pub fn base(&self) -> &ModuleBase<SimpleKycModule> {
        &self.base
    }

    /// One-shot initializer
    pub fn init(&self, claims: Arc<dyn ClaimSource>) -> ComplianceResult<()> {
        self.base.initializer(|| self.init_unchained(claims))
    }

    /// Per-layer initializer; only callable from [`SimpleKycModule::init`]
    pub fn init_unchained(&self, claims: Arc<dyn ClaimSource>) -> ComplianceResult<()> {
        self.base.only_initializing()?;
        *self.claims.write() = Some(claims);
        self.wire_handlers();
        Ok(())
    }

    fn wire_handlers(&self) {
        self.base
            .set_handler(topics::has_soul_sender(), Self::has_soul_sender);
        self.base
            .set_handler(topics::has_soul_recipient(), Self::has_soul_recipient);
        self.base
            .set_handler(topics::has_soul_operator(), Self::has_soul_operator);
    }

    fn has_soul(&self, ctx: &OperationContext, party: TransferParty) -> ComplianceResult<bool> {
        let claims = self
            .claims
            .read()
            .clone()
            .ok_or_else(|| ComplianceError::Claims("claim source not set".into()))?;
        Ok(claims.balance_of(&ctx.party(party)) > 0)
    }

    fn has_soul_sender(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.has_soul(ctx, TransferParty::Sender)
    }

    fn has_soul_recipient(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.has_soul(ctx, TransferParty::Recipient)
    }

    fn has_soul_operator(&self, ctx: &OperationContext) -> ComplianceResult<bool> {
        self.has_soul(ctx, TransferParty::Operator)
    }
}

impl Module for SimpleKycModule {
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

impl KycModule for SimpleKycModule {}
