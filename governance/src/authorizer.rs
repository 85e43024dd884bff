//! Replay-protected, domain-separated signature authorization.
//!
//! Two typed message kinds are recognized: [`Ballot`] (vote by signature)
//! and [`Delegation`] (delegate by signature). A payload digest is the
//! Blake2b-256 hash of the domain tag, a per-kind type tag, and the
//! payload fields in fixed-width little-endian encoding. Ed25519 has no
//! signer recovery, so the signer's public key travels with the signature
//! ([`SignedBallot`] / [`SignedDelegation`]); the signer address is derived
//! from that key and the per-signer nonce space is indexed by it.
//!
//! One nonce space serves both message kinds.

use crate::error::GovernanceError;
use crate::proposal::ProposalId;
use plenum_crypto::{address_from_public_key, blake2b_256_multi, sign_message, verify_signature};
use plenum_types::{Address, KeyPair, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Domain separator for every Plenum typed message.
pub const DOMAIN_TAG: &[u8] = b"plenum-governance-v1";

const BALLOT_TYPE_TAG: &[u8] = b"ballot";
const DELEGATION_TYPE_TAG: &[u8] = b"delegation";

/// Meta-store key used for persisting the nonce space.
const NONCE_SPACE_META_KEY: &str = "signature_nonce_state";

/// The signed payload of a vote-by-signature request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal_id: ProposalId,
    /// Wire support code (0 against, 1 for, 2 abstain). Validated by the
    /// engine, carried raw here so the digest covers exactly what was
    /// signed.
    pub support: u8,
    pub nonce: u64,
    pub deadline: Timestamp,
}

/// The signed payload of a delegate-by-signature request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegatee: Address,
    pub nonce: u64,
    pub expiry: Timestamp,
}

/// Detached signature over a [`Ballot`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedBallot {
    pub signer: PublicKey,
    /// The nonce the signer embedded in the ballot.
    pub nonce: u64,
    pub signature: Signature,
}

/// Detached signature over a [`Delegation`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedDelegation {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// Compute the domain-separated digest of a ballot.
pub fn ballot_digest(ballot: &Ballot) -> [u8; 32] {
    blake2b_256_multi(&[
        DOMAIN_TAG,
        BALLOT_TYPE_TAG,
        &ballot.proposal_id.value().to_le_bytes(),
        &[ballot.support],
        &ballot.nonce.to_le_bytes(),
        &ballot.deadline.as_secs().to_le_bytes(),
    ])
}

/// Compute the domain-separated digest of a delegation payload.
pub fn delegation_digest(delegation: &Delegation) -> [u8; 32] {
    blake2b_256_multi(&[
        DOMAIN_TAG,
        DELEGATION_TYPE_TAG,
        delegation.delegatee.as_bytes(),
        &delegation.nonce.to_le_bytes(),
        &delegation.expiry.as_secs().to_le_bytes(),
    ])
}

/// Sign a ballot with a key pair (client-side helper).
pub fn sign_ballot(ballot: &Ballot, keypair: &KeyPair) -> SignedBallot {
    let digest = ballot_digest(ballot);
    SignedBallot {
        signer: keypair.public.clone(),
        nonce: ballot.nonce,
        signature: sign_message(&digest, &keypair.private),
    }
}

/// Sign a delegation payload with a key pair (client-side helper).
pub fn sign_delegation(delegation: &Delegation, keypair: &KeyPair) -> SignedDelegation {
    let digest = delegation_digest(delegation);
    SignedDelegation {
        signer: keypair.public.clone(),
        signature: sign_message(&digest, &keypair.private),
    }
}

/// The signature verification boundary.
///
/// Isolated behind a trait so the scheme is substitutable in tests without
/// touching lifecycle logic.
pub trait SignatureScheme {
    fn verify(&self, digest: &[u8; 32], signer: &PublicKey, signature: &Signature) -> bool;
}

/// The production scheme: Ed25519 over the payload digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    fn verify(&self, digest: &[u8; 32], signer: &PublicKey, signature: &Signature) -> bool {
        verify_signature(digest, signature, signer)
    }
}

/// Verifies typed messages and owns the per-signer nonce space.
#[derive(Clone, Debug)]
pub struct SignatureAuthorizer<S = Ed25519Scheme> {
    scheme: S,
    nonces: HashMap<Address, u64>,
}

impl<S: SignatureScheme> SignatureAuthorizer<S> {
    pub fn new(scheme: S) -> Self {
        Self {
            scheme,
            nonces: HashMap::new(),
        }
    }

    /// The signer's next expected nonce.
    pub fn nonce(&self, signer: &Address) -> u64 {
        self.nonces.get(signer).copied().unwrap_or(0)
    }

    /// Verify a signed ballot without consuming the nonce.
    ///
    /// Checks, in order: the signature against the carried key, the
    /// deadline against `now`, and the payload nonce against the signer's
    /// counter. Returns the signer's address. A rejected payload never
    /// consumes a nonce.
    pub fn verify_ballot(
        &self,
        ballot: &Ballot,
        signer: &PublicKey,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<Address, GovernanceError> {
        let digest = ballot_digest(ballot);
        self.verify_payload(&digest, signer, signature, ballot.nonce, ballot.deadline, now)
    }

    /// Verify a signed delegation payload without consuming the nonce.
    pub fn verify_delegation(
        &self,
        delegation: &Delegation,
        signer: &PublicKey,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<Address, GovernanceError> {
        let digest = delegation_digest(delegation);
        self.verify_payload(
            &digest,
            signer,
            signature,
            delegation.nonce,
            delegation.expiry,
            now,
        )
    }

    /// Consume the signer's current nonce.
    ///
    /// Call only after a successful `verify_*` in the same operation, once
    /// every other validation of the operation has passed — failed
    /// operations must leave the nonce space untouched.
    pub fn consume_nonce(&mut self, signer: &Address) {
        let next = self.nonce(signer) + 1;
        self.nonces.insert(*signer, next);
    }

    fn verify_payload(
        &self,
        digest: &[u8; 32],
        signer: &PublicKey,
        signature: &Signature,
        nonce: u64,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<Address, GovernanceError> {
        if !self.scheme.verify(digest, signer, signature) {
            return Err(GovernanceError::InvalidSignature);
        }
        if now > deadline {
            return Err(GovernanceError::SignatureExpired { deadline, now });
        }
        let address = address_from_public_key(signer);
        let expected = self.nonce(&address);
        if nonce != expected {
            return Err(GovernanceError::NonceMismatch {
                expected,
                got: nonce,
            });
        }
        Ok(address)
    }

    /// Serialize the nonce space to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(&self.nonces).unwrap_or_default()
    }

    /// Restore the nonce space from serialized bytes.
    pub fn load_state(scheme: S, data: &[u8]) -> Self {
        Self {
            scheme,
            nonces: bincode::deserialize(data).unwrap_or_default(),
        }
    }

    /// The meta-store key used for nonce space persistence.
    pub fn meta_key() -> &'static str {
        NONCE_SPACE_META_KEY
    }
}

impl Default for SignatureAuthorizer<Ed25519Scheme> {
    fn default() -> Self {
        Self::new(Ed25519Scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenum_crypto::keypair_from_seed;

    fn ballot(nonce: u64) -> Ballot {
        Ballot {
            proposal_id: ProposalId::new(1),
            support: 1,
            nonce,
            deadline: Timestamp::new(10_000),
        }
    }

    #[test]
    fn valid_ballot_resolves_signer() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let auth = SignatureAuthorizer::default();
        let b = ballot(0);
        let signed = sign_ballot(&b, &kp);

        let signer = auth
            .verify_ballot(&b, &signed.signer, &signed.signature, Timestamp::new(100))
            .unwrap();
        assert_eq!(signer, address_from_public_key(&kp.public));
    }

    #[test]
    fn tampered_payload_rejected() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let auth = SignatureAuthorizer::default();
        let signed = sign_ballot(&ballot(0), &kp);

        // Same signature presented over a different support choice.
        let mut tampered = ballot(0);
        tampered.support = 0;
        let err = auth
            .verify_ballot(&tampered, &signed.signer, &signed.signature, Timestamp::new(100))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidSignature));
    }

    #[test]
    fn expired_deadline_rejected() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let auth = SignatureAuthorizer::default();
        let b = ballot(0);
        let signed = sign_ballot(&b, &kp);

        let err = auth
            .verify_ballot(&b, &signed.signer, &signed.signature, Timestamp::new(10_001))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::SignatureExpired { .. }));
        // At the deadline itself the ballot is still acceptable.
        assert!(auth
            .verify_ballot(&b, &signed.signer, &signed.signature, Timestamp::new(10_000))
            .is_ok());
    }

    #[test]
    fn consumed_nonce_rejected_on_replay() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let mut auth = SignatureAuthorizer::default();
        let b = ballot(0);
        let signed = sign_ballot(&b, &kp);
        let now = Timestamp::new(100);

        let signer = auth
            .verify_ballot(&b, &signed.signer, &signed.signature, now)
            .unwrap();
        auth.consume_nonce(&signer);

        let err = auth
            .verify_ballot(&b, &signed.signer, &signed.signature, now)
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::NonceMismatch { expected: 1, got: 0 }
        ));
    }

    #[test]
    fn nonce_space_is_per_signer() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let mut auth = SignatureAuthorizer::default();
        let now = Timestamp::new(100);

        let b = ballot(0);
        let s1 = sign_ballot(&b, &kp1);
        let signer1 = auth
            .verify_ballot(&b, &s1.signer, &s1.signature, now)
            .unwrap();
        auth.consume_nonce(&signer1);

        // A different signer still starts at nonce 0.
        let s2 = sign_ballot(&b, &kp2);
        assert!(auth.verify_ballot(&b, &s2.signer, &s2.signature, now).is_ok());
    }

    #[test]
    fn nonce_space_is_shared_across_message_kinds() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let mut auth = SignatureAuthorizer::default();
        let now = Timestamp::new(100);
        let signer = address_from_public_key(&kp.public);

        let b = ballot(0);
        let sb = sign_ballot(&b, &kp);
        auth.verify_ballot(&b, &sb.signer, &sb.signature, now).unwrap();
        auth.consume_nonce(&signer);

        // The next delegation must use nonce 1, not 0.
        let stale = Delegation {
            delegatee: Address::new([9u8; 32]),
            nonce: 0,
            expiry: Timestamp::new(10_000),
        };
        let sd = sign_delegation(&stale, &kp);
        let err = auth
            .verify_delegation(&stale, &sd.signer, &sd.signature, now)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NonceMismatch { .. }));

        let fresh = Delegation { nonce: 1, ..stale };
        let sd = sign_delegation(&fresh, &kp);
        assert!(auth
            .verify_delegation(&fresh, &sd.signer, &sd.signature, now)
            .is_ok());
    }

    #[test]
    fn ballot_and_delegation_digests_are_domain_separated() {
        // Even with identical field bytes, the type tags keep digests apart.
        let b = Ballot {
            proposal_id: ProposalId::new(0),
            support: 0,
            nonce: 0,
            deadline: Timestamp::EPOCH,
        };
        let d = Delegation {
            delegatee: Address::ZERO,
            nonce: 0,
            expiry: Timestamp::EPOCH,
        };
        assert_ne!(ballot_digest(&b), delegation_digest(&d));
    }

    #[test]
    fn snapshot_roundtrip_preserves_nonces() {
        let mut auth = SignatureAuthorizer::default();
        let signer = Address::new([5u8; 32]);
        auth.consume_nonce(&signer);
        auth.consume_nonce(&signer);

        let restored = SignatureAuthorizer::load_state(Ed25519Scheme, &auth.save_state());
        assert_eq!(restored.nonce(&signer), 2);
    }
}
