//! Fungible asset

use regulus_core::{Address, AssetOperation, OperationContext};
use rust_decimal::Decimal;

use crate::config::AssetConfig;
use crate::error::AssetResult;
use crate::ledger::FungibleLedger;
use crate::pipeline::AssetCore;

/// Compliance-gated fungible token
pub struct TokenF {
    core: AssetCore,
    ledger: FungibleLedger,
}

impl TokenF {
    pub fn new(this: Address, owner: Address, config: &AssetConfig) -> AssetResult<Self> {
        Ok(Self {
            core: AssetCore::new(this, owner, config)?,
            ledger: FungibleLedger::new(),
        })
    }

    pub fn core(&self) -> &AssetCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut AssetCore {
        &mut self.core
    }

    // === Getters ===

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn symbol(&self) -> &str {
        self.core.symbol()
    }

    pub fn balance_of(&self, account: Address) -> Decimal {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Decimal {
        self.ledger.allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Decimal {
        self.ledger.total_supply()
    }

    // === Operations ===

    pub fn mint(&mut self, caller: Address, to: Address, amount: Decimal) -> AssetResult<()> {
        self.core.require_role(self.core.roles().mint, caller)?;
        let ctx = context(AssetOperation::Mint, caller, Address::ZERO, to, amount);
        self.core
            .execute(ctx, &mut self.ledger, |ledger| ledger.mint(to, amount))
    }

    pub fn burn(&mut self, caller: Address, from: Address, amount: Decimal) -> AssetResult<()> {
        self.core.require_role(self.core.roles().burn, caller)?;
        let ctx = context(AssetOperation::Burn, caller, from, Address::ZERO, amount);
        self.core
            .execute(ctx, &mut self.ledger, |ledger| ledger.burn(from, amount))
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: Decimal) -> AssetResult<()> {
        let ctx = context(AssetOperation::Transfer, caller, caller, to, amount);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.transfer(caller, to, amount)
        })
    }

    /// Move `from`'s tokens using the allowance `from` gave `caller`
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> AssetResult<()> {
        let ctx = context(AssetOperation::TransferFrom, caller, from, to, amount);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.spend_allowance(from, caller, amount)?;
            ledger.transfer(from, to, amount)
        })
    }

    /// Set `spender`'s allowance over `caller`'s balance (not gated)
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Decimal) -> AssetResult<()> {
        self.ledger.approve(caller, spender, amount)?;
        tracing::debug!(owner = %caller, spender = %spender, amount = %amount, "Allowance set");
        Ok(())
    }

    /// Move tokens without the holder's consent
    pub fn forced_transfer(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> AssetResult<()> {
        self.core
            .require_role(self.core.roles().forced_transfer, caller)?;
        let ctx = context(AssetOperation::ForcedTransfer, caller, from, to, amount);
        self.core
            .execute(ctx, &mut self.ledger, |ledger| ledger.transfer(from, to, amount))
    }

    /// Move the whole balance of a lost account to its replacement
    pub fn recovery(&mut self, caller: Address, lost: Address, new: Address) -> AssetResult<Decimal> {
        self.core.require_role(self.core.roles().recovery, caller)?;
        let amount = self.ledger.balance_of(lost);
        let ctx = context(AssetOperation::Recovery, caller, lost, new, amount);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.transfer(lost, new, amount)?;
            Ok(amount)
        })
    }
}

fn context(
    operation: AssetOperation,
    operator: Address,
    from: Address,
    to: Address,
    amount: Decimal,
) -> OperationContext {
    OperationContext::for_operation(operation)
        .with_from(from)
        .with_to(to)
        .with_amount(amount)
        .with_operator(operator)
}
