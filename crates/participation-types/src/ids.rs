//! Fixed-width identifier wrappers.
//!
//! Identifiers are opaque byte arrays. Their canonical textual form is
//! lowercase hex with a `0x` prefix, which is what [`Display`] produces and
//! what serde reads and writes. Parsing also accepts the bare hex form.
//!
//! [`Display`]: core::fmt::Display

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A ledger checkpoint number. Milestones are issued in strictly
/// increasing order.
pub type MilestoneIndex = u32;

/// Errors that can occur when parsing an identifier from text.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was not valid hex or had the wrong length.
    #[error("invalid identifier hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Generates a newtype wrapper around a fixed-size byte array.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $len:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Number of bytes in the identifier.
            pub const LENGTH: usize = $len;

            /// Wrap raw identifier bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Return the raw identifier bytes.
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Encode as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Parse from hex, with or without a `0x` prefix.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Hex`] if the input is not valid hex or does
            /// not decode to exactly [`Self::LENGTH`] bytes.
            pub fn from_hex(s: &str) -> Result<Self, IdError> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(digits, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl core::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id! {
    /// Unique identifier of a participation event in the registry.
    EventId, 32
}

define_id! {
    /// Identifier of the ledger output that carries a participation
    /// (32-byte transaction id followed by a 2-byte output index).
    OutputId, 34
}
