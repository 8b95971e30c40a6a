//! Address - 20-byte party / component identifier
//!
//! Every participant (holder, operator, asset, module, facet) is named by an
//! [`Address`]. [`Address::ZERO`] stands for "nobody": the `from` of a mint
//! and the `to` of a burn.

use crate::bytes::digest;

crate::fixed_bytes!(
    /// 20-byte identifier
    ///
    /// # Example
    /// ```
    /// use regulus_core::Address;
    ///
    /// let alice = Address::derive("alice");
    /// assert_eq!(alice, Address::derive("alice"));
    /// assert_ne!(alice, Address::ZERO);
    ///
    /// let parsed: Address = alice.to_string().parse().unwrap();
    /// assert_eq!(parsed, alice);
    /// ```
    Address,
    20
);

impl Address {
    /// Deterministic address for a label (first 20 bytes of SHA-256)
    pub fn derive(label: &str) -> Self {
        let hash = digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Self(bytes)
    }
}
