//! Topics and context keys
//!
//! A [`Topic`] names one atomic sub-rule a module enforces. A [`ContextKey`]
//! selects which topics apply to an operation, optionally narrowed to one
//! [`TransferParty`].

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::bytes::digest;
use crate::selector::Selector;

crate::fixed_bytes!(
    /// 32-byte sub-rule identifier
    Topic,
    32
);

crate::fixed_bytes!(
    /// 32-byte key into a module's topic table
    ContextKey,
    32
);

// Domain tags keep the two derivation schemes disjoint.
const SELECTOR_SCHEME: u8 = 0x01;
const PARTY_SCHEME: u8 = 0x02;

/// Role a party plays in an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferParty {
    Sender = 0,
    Recipient = 1,
    Operator = 2,
}

impl Topic {
    /// Topic for a rule name (SHA-256 of the name)
    pub fn named(name: &str) -> Self {
        Self(digest(name.as_bytes()))
    }
}

impl ContextKey {
    /// Key derived from the selector alone
    pub fn for_selector(selector: Selector) -> Self {
        let mut input = Vec::with_capacity(5);
        input.push(SELECTOR_SCHEME);
        input.extend_from_slice(selector.as_bytes());
        Self(digest(&input))
    }

    /// Key derived from the selector and the party being checked
    pub fn for_party(selector: Selector, party: TransferParty) -> Self {
        let mut input = Vec::with_capacity(6);
        input.push(PARTY_SCHEME);
        input.extend_from_slice(selector.as_bytes());
        input.push(party as u8);
        Self(digest(&input))
    }
}
