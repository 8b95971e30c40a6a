//! Operation context - the record passed through the whole compliance pipeline

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::selector::{AssetOperation, Selector};
use crate::topic::TransferParty;

/// Immutable description of one in-flight asset operation
///
/// Built fresh for each call and discarded afterwards. `operator` is the
/// account that invoked the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    /// Logical operation
    pub selector: Selector,

    /// Party giving up value (`Address::ZERO` on mint)
    pub from: Address,

    /// Party receiving value (`Address::ZERO` on burn)
    pub to: Address,

    /// Fungible amount (zero for non-fungible operations)
    pub amount: Decimal,

    /// Non-fungible token id (zero for fungible operations)
    pub token_id: u64,

    /// Caller of the operation
    pub operator: Address,

    /// Opaque extra payload
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl OperationContext {
    /// Create a context for an arbitrary selector
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            from: Address::ZERO,
            to: Address::ZERO,
            amount: Decimal::ZERO,
            token_id: 0,
            operator: Address::ZERO,
            data: Vec::new(),
        }
    }

    /// Create a context for a base asset operation
    pub fn for_operation(operation: AssetOperation) -> Self {
        Self::new(operation.selector())
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = from;
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = to;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_token_id(mut self, token_id: u64) -> Self {
        self.token_id = token_id;
        self
    }

    pub fn with_operator(mut self, operator: Address) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Address playing `party` in this operation
    pub fn party(&self, party: TransferParty) -> Address {
        match party {
            TransferParty::Sender => self.from,
            TransferParty::Recipient => self.to,
            TransferParty::Operator => self.operator,
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.strip_prefix("0x").unwrap_or(&raw);
        hex::decode(trimmed).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_context_builder() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");

        let ctx = OperationContext::for_operation(AssetOperation::Transfer)
            .with_from(alice)
            .with_to(bob)
            .with_amount(dec!(2))
            .with_operator(alice);

        assert_eq!(ctx.selector, AssetOperation::Transfer.selector());
        assert_eq!(ctx.party(TransferParty::Sender), alice);
        assert_eq!(ctx.party(TransferParty::Recipient), bob);
        assert_eq!(ctx.party(TransferParty::Operator), alice);
        assert_eq!(ctx.token_id, 0);
        assert!(ctx.data.is_empty());
    }

    #[test]
    fn test_mint_context_defaults_to_zero_sender() {
        let ctx = OperationContext::for_operation(AssetOperation::Mint).with_to(Address::derive("bob"));
        assert!(ctx.from.is_zero());
    }

    #[test]
    fn test_context_serialization() {
        let ctx = OperationContext::for_operation(AssetOperation::Burn)
            .with_from(Address::derive("alice"))
            .with_amount(dec!(1.5))
            .with_data(vec![0xde, 0xad]);

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["data"], "0xdead");
        assert_eq!(json["amount"], "1.5");

        let parsed: OperationContext = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ctx);
    }
}
