//! Claim sources - external attestation registries consulted by KYC modules

use std::collections::HashMap;

use parking_lot::RwLock;
use regulus_core::Address;

use crate::error::{ClaimError, ClaimResult};

/// Registry answering "does this account hold an attestation?"
pub trait ClaimSource: Send + Sync {
    /// Number of attestations held by `holder`
    fn balance_of(&self, holder: &Address) -> u64;
}

#[derive(Debug, Default)]
struct SoulboundState {
    owners: HashMap<u64, Address>,
    balances: HashMap<Address, u64>,
}

/// In-memory soulbound (non-transferable) attestation token
///
/// The issuer mints a token to a verified holder and burns it to withdraw
/// the attestation. Tokens never move between holders.
#[derive(Debug, Default)]
pub struct SoulboundRegistry {
    state: RwLock<SoulboundState>,
}

impl SoulboundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue attestation `token_id` to `holder`
    pub fn mint(&self, holder: Address, token_id: u64) -> ClaimResult<()> {
        if holder.is_zero() {
            return Err(ClaimError::InvalidHolder(holder));
        }

        let mut state = self.state.write();
        if state.owners.contains_key(&token_id) {
            return Err(ClaimError::TokenAlreadyMinted(token_id));
        }
        state.owners.insert(token_id, holder);
        *state.balances.entry(holder).or_insert(0) += 1;

        tracing::info!(holder = %holder, token_id, "Attestation issued");
        Ok(())
    }

    /// Withdraw attestation `token_id`
    pub fn burn(&self, token_id: u64) -> ClaimResult<()> {
        let mut state = self.state.write();
        let holder = state
            .owners
            .remove(&token_id)
            .ok_or(ClaimError::NoSuchToken(token_id))?;
        if let Some(balance) = state.balances.get_mut(&holder) {
            *balance -= 1;
            if *balance == 0 {
                state.balances.remove(&holder);
            }
        }

        tracing::info!(holder = %holder, token_id, "Attestation withdrawn");
        Ok(())
    }

    pub fn owner_of(&self, token_id: u64) -> Option<Address> {
        self.state.read().owners.get(&token_id).copied()
    }
}

impl ClaimSource for SoulboundRegistry {
    fn balance_of(&self, holder: &Address) -> u64 {
        self.state.read().balances.get(holder).copied().unwrap_or(0)
    }
}
