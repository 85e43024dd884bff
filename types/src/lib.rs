//! Fundamental types for the Plenum governance engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, token amounts, the two governance clocks
//! (block height and wall-clock time), signing key material, and the
//! tunable governance parameters.

pub mod address;
pub mod amount;
pub mod clock;
pub mod config;
pub mod keys;

pub use address::Address;
pub use amount::TokenAmount;
pub use clock::{BlockHeight, Clock, Timestamp};
pub use config::{ConfigError, GovernanceConfig};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
