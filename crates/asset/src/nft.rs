//! Non-fungible asset

use regulus_core::{Address, AssetOperation, OperationContext};
use rust_decimal::Decimal;

use crate::config::AssetConfig;
use crate::error::{AssetResult, LedgerError};
use crate::ledger::NonFungibleLedger;
use crate::pipeline::AssetCore;

/// Compliance-gated non-fungible token
pub struct NftF {
    core: AssetCore,
    ledger: NonFungibleLedger,
}

impl NftF {
    pub fn new(this: Address, owner: Address, config: &AssetConfig) -> AssetResult<Self> {
        Ok(Self {
            core: AssetCore::new(this, owner, config)?,
            ledger: NonFungibleLedger::new(),
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

    pub fn balance_of(&self, account: Address) -> u64 {
        self.ledger.balance_of(account)
    }

    pub fn owner_of(&self, token_id: u64) -> Option<Address> {
        self.ledger.owner_of(token_id)
    }

    pub fn tokens_of(&self, account: Address) -> Vec<u64> {
        self.ledger.tokens_of(account)
    }

    pub fn approved(&self, token_id: u64) -> Option<Address> {
        self.ledger.approved(token_id)
    }

    pub fn total_supply(&self) -> u64 {
        self.ledger.total_supply()
    }

    // === Operations ===

    pub fn mint(&mut self, caller: Address, to: Address, token_id: u64) -> AssetResult<()> {
        self.core.require_role(self.core.roles().mint, caller)?;
        let ctx = context(AssetOperation::Mint, caller, Address::ZERO, to, token_id);
        self.core
            .execute(ctx, &mut self.ledger, |ledger| ledger.mint(to, token_id))
    }

    pub fn burn(&mut self, caller: Address, token_id: u64) -> AssetResult<()> {
        self.core.require_role(self.core.roles().burn, caller)?;
        let holder = self.holder(token_id)?;
        let ctx = context(AssetOperation::Burn, caller, holder, Address::ZERO, token_id);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.burn(token_id)?;
            Ok(())
        })
    }

    /// Move a token the caller owns
    pub fn transfer(&mut self, caller: Address, to: Address, token_id: u64) -> AssetResult<()> {
        let ctx = context(AssetOperation::Transfer, caller, caller, to, token_id);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.transfer(caller, to, token_id)
        })
    }

    /// Move a token the caller owns or is approved for
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> AssetResult<()> {
        let ctx = context(AssetOperation::TransferFrom, caller, from, to, token_id);
        self.core.execute(ctx, &mut self.ledger, |ledger| {
            ledger.check_spender(caller, token_id)?;
            ledger.transfer(from, to, token_id)
        })
    }

    /// Approve `spender` for one token the caller owns (not gated)
    pub fn approve(&mut self, caller: Address, spender: Address, token_id: u64) -> AssetResult<()> {
        self.ledger.approve(caller, spender, token_id)?;
        tracing::debug!(owner = %caller, spender = %spender, token_id, "Approval set");
        Ok(())
    }

    /// Move a token without the holder's consent
    pub fn forced_transfer(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> AssetResult<()> {
        self.core
            .require_role(self.core.roles().forced_transfer, caller)?;
        let ctx = context(AssetOperation::ForcedTransfer, caller, from, to, token_id);
        self.core
            .execute(ctx, &mut self.ledger, |ledger| ledger.transfer(from, to, token_id))
    }

    /// Move every token of a lost account to its replacement
    ///
    /// The context amount is the number of tokens moved.
    pub fn recovery(&mut self, caller: Address, lost: Address, new: Address) -> AssetResult<Vec<u64>> {
        self.core.require_role(self.core.roles().recovery, caller)?;
        let tokens = self.ledger.tokens_of(lost);
        let ctx = OperationContext::for_operation(AssetOperation::Recovery)
            .with_from(lost)
            .with_to(new)
            .with_amount(Decimal::from(tokens.len() as u64))
            .with_operator(caller);

        self.core.execute(ctx, &mut self.ledger, |ledger| {
            for &token_id in &tokens {
                ledger.transfer(lost, new, token_id)?;
            }
            Ok(tokens)
        })
    }

    fn holder(&self, token_id: u64) -> Result<Address, LedgerError> {
        self.ledger
            .owner_of(token_id)
            .ok_or(LedgerError::NoSuchToken(token_id))
    }
}

fn context(
    operation: AssetOperation,
    operator: Address,
    from: Address,
    to: Address,
    token_id: u64,
) -> OperationContext {
    OperationContext::for_operation(operation)
        .with_from(from)
        .with_to(to)
        .with_token_id(token_id)
        .with_operator(operator)
}
