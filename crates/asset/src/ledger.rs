//! In-memory token accounting
//!
//! Ledgers only enforce accounting rules (balances, ownership, allowances).
//! Authorization and compliance are decided by the asset before a ledger
//! method is called.
//!
//! Between [`Journaled::begin`] and [`Journaled::commit`] every write records
//! the value it replaced, so [`Journaled::rollback`] can undo exactly the
//! entries an operation touched.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use regulus_core::Address;
use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Ledger whose writes since `begin` can be undone
pub trait Journaled {
    /// Start recording writes
    fn begin(&mut self);

    /// Keep the recorded writes and stop recording
    fn commit(&mut self);

    /// Undo the recorded writes, newest first, and stop recording
    fn rollback(&mut self);
}

/// Write `value` (or remove the entry) and return what it replaced
fn put<K: Eq + Hash, V>(map: &mut HashMap<K, V>, key: K, value: Option<V>) -> Option<V> {
    match value {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    }
}

// === Fungible ===

/// Entry value before a journaled write
#[derive(Debug, Clone, Copy)]
enum FungibleUndo {
    Balance(Address, Option<Decimal>),
    Allowance((Address, Address), Option<Decimal>),
    TotalSupply(Decimal),
}

/// Balances and allowances of a fungible token
#[derive(Debug, Clone, Default)]
pub struct FungibleLedger {
    balances: HashMap<Address, Decimal>,
    allowances: HashMap<(Address, Address), Decimal>,
    total_supply: Decimal,
    journal: Option<Vec<FungibleUndo>>,
}

impl FungibleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: Address) -> Decimal {
        self.balances.get(&account).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Decimal {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_supply(&self) -> Decimal {
        self.total_supply
    }

    pub fn mint(&mut self, to: Address, amount: Decimal) -> Result<(), LedgerError> {
        check_amount(amount)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.credit(to, amount);
        self.set_total_supply(self.total_supply + amount);
        Ok(())
    }

    pub fn burn(&mut self, from: Address, amount: Decimal) -> Result<(), LedgerError> {
        check_amount(amount)?;
        self.debit(from, amount)?;
        self.set_total_supply(self.total_supply - amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: Decimal) -> Result<(), LedgerError> {
        check_amount(amount)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Decimal) -> Result<(), LedgerError> {
        check_amount(amount)?;
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.set_allowance((owner, spender), Some(amount));
        Ok(())
    }

    /// Consume `amount` of the allowance `owner` gave `spender`
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                required: amount,
            });
        }
        self.set_allowance((owner, spender), Some(allowance - amount));
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: Decimal) {
        let balance = self.balance_of(account) + amount;
        self.set_balance(account, Some(balance));
    }

    fn debit(&mut self, account: Address, amount: Decimal) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                balance,
                required: amount,
            });
        }
        self.set_balance(account, Some(balance - amount));
        Ok(())
    }

    // === Journaled writes ===

    fn set_balance(&mut self, account: Address, value: Option<Decimal>) {
        let previous = put(&mut self.balances, account, value);
        self.record(FungibleUndo::Balance(account, previous));
    }

    fn set_allowance(&mut self, key: (Address, Address), value: Option<Decimal>) {
        let previous = put(&mut self.allowances, key, value);
        self.record(FungibleUndo::Allowance(key, previous));
    }

    fn set_total_supply(&mut self, value: Decimal) {
        let previous = std::mem::replace(&mut self.total_supply, value);
        self.record(FungibleUndo::TotalSupply(previous));
    }

    fn record(&mut self, undo: FungibleUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }
}

impl Journaled for FungibleLedger {
    fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for undo in journal.into_iter().rev() {
            match undo {
                FungibleUndo::Balance(account, previous) => self.set_balance(account, previous),
                FungibleUndo::Allowance(key, previous) => self.set_allowance(key, previous),
                FungibleUndo::TotalSupply(previous) => self.set_total_supply(previous),
            }
        }
    }
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_sign_negative() {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

// === Non-fungible ===

#[derive(Debug, Clone, Copy)]
enum NonFungibleUndo {
    Owner(u64, Option<Address>),
    Approval(u64, Option<Address>),
    Held(Address, u64),
    Released(Address, u64),
}

/// Ownership and approvals of a non-fungible token
#[derive(Debug, Clone, Default)]
pub struct NonFungibleLedger {
    owners: HashMap<u64, Address>,
    holdings: HashMap<Address, BTreeSet<u64>>,
    approvals: HashMap<u64, Address>,
    journal: Option<Vec<NonFungibleUndo>>,
}

impl NonFungibleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, token_id: u64) -> Option<Address> {
        self.owners.get(&token_id).copied()
    }

    pub fn balance_of(&self, account: Address) -> u64 {
        self.holdings
            .get(&account)
            .map_or(0, |tokens| tokens.len() as u64)
    }

    /// Tokens held by `account`, ascending
    pub fn tokens_of(&self, account: Address) -> Vec<u64> {
        self.holdings
            .get(&account)
            .map(|tokens| tokens.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn approved(&self, token_id: u64) -> Option<Address> {
        self.approvals.get(&token_id).copied()
    }

    pub fn total_supply(&self) -> u64 {
        self.owners.len() as u64
    }

    pub fn mint(&mut self, to: Address, token_id: u64) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if self.owners.contains_key(&token_id) {
            return Err(LedgerError::TokenAlreadyMinted(token_id));
        }
        self.set_owner(token_id, Some(to));
        self.hold(to, token_id);
        Ok(())
    }

    pub fn burn(&mut self, token_id: u64) -> Result<Address, LedgerError> {
        let owner = self
            .owner_of(token_id)
            .ok_or(LedgerError::NoSuchToken(token_id))?;
        self.set_owner(token_id, None);
        self.release(owner, token_id);
        self.set_approval(token_id, None);
        Ok(owner)
    }

    /// Move `token_id` from `from` to `to`; `from` must be the owner
    pub fn transfer(&mut self, from: Address, to: Address, token_id: u64) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let owner = self.require_owner(from, token_id)?;
        self.release(owner, token_id);
        self.set_approval(token_id, None);
        self.set_owner(token_id, Some(to));
        self.hold(to, token_id);
        Ok(())
    }

    /// Let `spender` move `token_id` once; `owner` must own it
    pub fn approve(&mut self, owner: Address, spender: Address, token_id: u64) -> Result<(), LedgerError> {
        self.require_owner(owner, token_id)?;
        self.set_approval(token_id, Some(spender));
        Ok(())
    }

    /// Require `spender` to own `token_id` or be approved for it
    pub fn check_spender(&self, spender: Address, token_id: u64) -> Result<(), LedgerError> {
        let owner = self.owner_of(token_id).ok_or(LedgerError::NoSuchToken(token_id))?;
        if owner == spender || self.approved(token_id) == Some(spender) {
            Ok(())
        } else {
            Err(LedgerError::NotApproved { spender, token_id })
        }
    }

    fn require_owner(&self, account: Address, token_id: u64) -> Result<Address, LedgerError> {
        match self.owner_of(token_id) {
            None => Err(LedgerError::NoSuchToken(token_id)),
            Some(owner) if owner != account => Err(LedgerError::NotOwner { account, token_id }),
            Some(owner) => Ok(owner),
        }
    }

    // === Journaled writes ===

    fn set_owner(&mut self, token_id: u64, owner: Option<Address>) {
        let previous = put(&mut self.owners, token_id, owner);
        self.record(NonFungibleUndo::Owner(token_id, previous));
    }

    fn set_approval(&mut self, token_id: u64, spender: Option<Address>) {
        let previous = put(&mut self.approvals, token_id, spender);
        if previous != spender {
            self.record(NonFungibleUndo::Approval(token_id, previous));
        }
    }

    fn hold(&mut self, account: Address, token_id: u64) {
        if self.holdings.entry(account).or_default().insert(token_id) {
            self.record(NonFungibleUndo::Held(account, token_id));
        }
    }

    fn release(&mut self, owner: Address, token_id: u64) {
        let Some(tokens) = self.holdings.get_mut(&owner) else {
            return;
        };
        let removed = tokens.remove(&token_id);
        if tokens.is_empty() {
            self.holdings.remove(&owner);
        }
        if removed {
            self.record(NonFungibleUndo::Released(owner, token_id));
        }
    }

    fn record(&mut self, undo: NonFungibleUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }
}

impl Journaled for NonFungibleLedger {
    fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for undo in journal.into_iter().rev() {
            match undo {
                NonFungibleUndo::Owner(token_id, previous) => self.set_owner(token_id, previous),
                NonFungibleUndo::Approval(token_id, previous) => self.set_approval(token_id, previous),
                NonFungibleUndo::Held(account, token_id) => self.release(account, token_id),
                NonFungibleUndo::Released(account, token_id) => self.hold(account, token_id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    #[test]
    fn test_fungible_mint_transfer_burn() {
        let mut ledger = FungibleLedger::new();
        ledger.mint(alice(), dec!(10)).unwrap();
        ledger.transfer(alice(), bob(), dec!(4)).unwrap();
        ledger.burn(bob(), dec!(1)).unwrap();

        assert_eq!(ledger.balance_of(alice()), dec!(6));
        assert_eq!(ledger.balance_of(bob()), dec!(3));
        assert_eq!(ledger.total_supply(), dec!(9));
    }

    #[test]
    fn test_fungible_insufficient_balance() {
        let mut ledger = FungibleLedger::new();
        ledger.mint(alice(), dec!(1)).unwrap();

        let err = ledger.transfer(alice(), bob(), dec!(2)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: alice(),
                balance: dec!(1),
                required: dec!(2)
            }
        );
        assert_eq!(ledger.balance_of(alice()), dec!(1));
    }

    #[test]
    fn test_fungible_allowance() {
        let mut ledger = FungibleLedger::new();
        ledger.approve(alice(), bob(), dec!(5)).unwrap();
        ledger.spend_allowance(alice(), bob(), dec!(3)).unwrap();
        assert_eq!(ledger.allowance(alice(), bob()), dec!(2));

        assert!(matches!(
            ledger.spend_allowance(alice(), bob(), dec!(3)),
            Err(LedgerError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_fungible_rejects_negative_and_zero_address() {
        let mut ledger = FungibleLedger::new();
        assert_eq!(
            ledger.mint(alice(), dec!(-1)),
            Err(LedgerError::InvalidAmount(dec!(-1)))
        );
        assert_eq!(
            ledger.mint(Address::ZERO, dec!(1)),
            Err(LedgerError::ZeroAddress)
        );
    }

    #[test]
    fn test_nft_lifecycle() {
        let mut ledger = NonFungibleLedger::new();
        ledger.mint(alice(), 1).unwrap();
        ledger.mint(alice(), 2).unwrap();
        assert_eq!(ledger.tokens_of(alice()), vec![1, 2]);

        ledger.transfer(alice(), bob(), 1).unwrap();
        assert_eq!(ledger.owner_of(1), Some(bob()));
        assert_eq!(ledger.balance_of(alice()), 1);

        assert_eq!(ledger.burn(2).unwrap(), alice());
        assert_eq!(ledger.balance_of(alice()), 0);
        assert_eq!(ledger.total_supply(), 1);
    }

    #[test]
    fn test_nft_ownership_rules() {
        let mut ledger = NonFungibleLedger::new();
        ledger.mint(alice(), 1).unwrap();

        assert_eq!(ledger.mint(bob(), 1), Err(LedgerError::TokenAlreadyMinted(1)));
        assert_eq!(
            ledger.transfer(bob(), alice(), 1),
            Err(LedgerError::NotOwner {
                account: bob(),
                token_id: 1
            })
        );
        assert_eq!(ledger.transfer(alice(), bob(), 9), Err(LedgerError::NoSuchToken(9)));
    }

    #[test]
    fn test_fungible_rollback_restores_touched_entries() {
        let mut ledger = FungibleLedger::new();
        ledger.mint(alice(), dec!(10)).unwrap();
        ledger.approve(alice(), bob(), dec!(4)).unwrap();

        ledger.begin();
        ledger.spend_allowance(alice(), bob(), dec!(4)).unwrap();
        ledger.transfer(alice(), bob(), dec!(4)).unwrap();
        ledger.burn(bob(), dec!(1)).unwrap();
        ledger.rollback();

        assert_eq!(ledger.balance_of(alice()), dec!(10));
        assert_eq!(ledger.balance_of(bob()), dec!(0));
        assert!(!ledger.balances.contains_key(&bob()));
        assert_eq!(ledger.allowance(alice(), bob()), dec!(4));
        assert_eq!(ledger.total_supply(), dec!(10));
    }

    #[test]
    fn test_fungible_commit_keeps_writes() {
        let mut ledger = FungibleLedger::new();
        ledger.begin();
        ledger.mint(alice(), dec!(3)).unwrap();
        ledger.commit();

        // Nothing recorded after commit
        ledger.rollback();
        assert_eq!(ledger.balance_of(alice()), dec!(3));
        assert_eq!(ledger.total_supply(), dec!(3));
    }

    #[test]
    fn test_nft_rollback_restores_ownership() {
        let mut ledger = NonFungibleLedger::new();
        ledger.mint(alice(), 1).unwrap();
        ledger.mint(alice(), 2).unwrap();
        ledger.approve(alice(), bob(), 1).unwrap();

        ledger.begin();
        ledger.transfer(alice(), bob(), 1).unwrap();
        ledger.transfer(alice(), bob(), 2).unwrap();
        ledger.mint(bob(), 3).unwrap();
        ledger.rollback();

        assert_eq!(ledger.tokens_of(alice()), vec![1, 2]);
        assert_eq!(ledger.balance_of(bob()), 0);
        assert_eq!(ledger.owner_of(3), None);
        assert_eq!(ledger.approved(1), Some(bob()));
        assert_eq!(ledger.total_supply(), 2);
    }

    #[test]
    fn test_nft_approval_cleared_on_transfer() {
        let mut ledger = NonFungibleLedger::new();
        ledger.mint(alice(), 1).unwrap();
        ledger.approve(alice(), bob(), 1).unwrap();
        assert!(ledger.check_spender(bob(), 1).is_ok());

        ledger.transfer(alice(), bob(), 1).unwrap();
        assert_eq!(ledger.approved(1), None);
        assert!(ledger.check_spender(alice(), 1).is_err());
    }
}
