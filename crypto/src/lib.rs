//! Cryptographic primitives for Plenum.
//!
//! Ed25519 for signing, Blake2b-256 for hashing and address derivation.
//! Higher layers (typed-message digests, nonce accounting) live in the
//! governance crate; this crate is deliberately policy-free.

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::address_from_public_key;
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
