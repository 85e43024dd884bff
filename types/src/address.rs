//! Account address type, displayed with a `pln_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte account address.
///
/// Derived from the account's Ed25519 public key via Blake2b-256
/// (see `plenum_crypto::address_from_public_key`). The all-zero address is
/// the "no delegate" sentinel: delegating to it clears a delegation, and no
/// key pair hashes to it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// The display prefix for all Plenum addresses.
    pub const PREFIX: &'static str = "pln_";

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}{})", Self::PREFIX, hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(&self.0))
    }
}

// Inline hex encoding so this crate stays free of the `hex` dependency.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
