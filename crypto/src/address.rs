//! Address derivation from signing keys.

use crate::hash::blake2b_256;
use plenum_types::{Address, PublicKey};

/// Derive an account address from an Ed25519 public key.
///
/// The address is the Blake2b-256 digest of the raw key bytes. The zero
/// address is unreachable this way, which is what makes it safe as the
/// "no delegate" sentinel.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    Address::new(blake2b_256(public_key.as_bytes()))
}
