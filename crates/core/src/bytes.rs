//! Fixed-width byte identifiers
//!
//! Addresses, selectors, topics, context keys and roles are all opaque
//! fixed-width byte strings rendered as `0x`-prefixed lowercase hex.
//! [`fixed_bytes!`] generates the shared plumbing for them.

use sha2::{Digest, Sha256};

use crate::error::ParseError;

/// SHA-256 of `input`
pub fn digest(input: &[u8]) -> [u8; 32] {
    Sha256::digest(input).into()
}

/// Decode a `0x`-prefixed (or bare) hex string into exactly `N` bytes
pub fn parse_hex<const N: usize>(input: &str) -> Result<[u8; N], ParseError> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    let raw = hex::decode(trimmed).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    raw.try_into().map_err(|raw: Vec<u8>| ParseError::InvalidLength {
        expected: N,
        actual: raw.len(),
    })
}

/// Generate a fixed-width byte newtype
///
/// The generated type is `Copy`, ordered, hashable, displays as hex and
/// serializes as a hex string.
#[macro_export]
macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// All-zero value
            pub const ZERO: Self = Self([0u8; $len]);

            /// Width in bytes
            pub const LEN: usize = $len;

            /// Wrap raw bytes
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Check for the all-zero value
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            /// Lowercase hex with `0x` prefix
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::bytes::parse_hex::<$len>(s).map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::error::ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_hex()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}
