//! Proposal storage — the identifier space and the id → record mapping.

use crate::proposal::{Proposal, ProposalAction, ProposalId};
use plenum_types::{Address, BlockHeight, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Meta-store key used for persisting the proposal store state.
const PROPOSAL_STORE_META_KEY: &str = "proposal_store_state";

/// Owns the proposal identifier space and all proposal records.
///
/// Identifiers are allocated sequentially starting at 1. A record, once
/// allocated, is never deleted and its id is never reused.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalStore {
    next_id: u64,
    proposals: BTreeMap<ProposalId, Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            proposals: BTreeMap::new(),
        }
    }

    /// Allocate the next id and insert a fresh record with empty tallies.
    pub fn create(
        &mut self,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: String,
        start_height: BlockHeight,
        end_height: BlockHeight,
    ) -> ProposalId {
        let id = ProposalId::new(self.next_id);
        self.next_id += 1;
        self.proposals.insert(
            id,
            Proposal {
                id,
                proposer,
                actions,
                description,
                start_height,
                end_height,
                for_votes: TokenAmount::ZERO,
                against_votes: TokenAmount::ZERO,
                abstain_votes: TokenAmount::ZERO,
                canceled: false,
                executed: false,
                eta: Timestamp::EPOCH,
                receipts: HashMap::new(),
            },
        );
        id
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn get_mut(&mut self, id: ProposalId) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }

    /// Number of proposals ever created.
    pub fn count(&self) -> usize {
        self.proposals.len()
    }

    /// All proposals in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Serialize the store to bytes for persistence by the embedder.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore the store from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        bincode::deserialize(data).unwrap_or_else(|_| Self::new())
    }

    /// The meta-store key used for proposal store persistence.
    pub fn meta_key() -> &'static str {
        PROPOSAL_STORE_META_KEY
    }
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> ProposalAction {
        ProposalAction {
            target: Address::new([2u8; 32]),
            value: TokenAmount::ZERO,
            signature: String::new(),
            calldata: vec![1, 2, 3],
        }
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut store = ProposalStore::new();
        let proposer = Address::new([1u8; 32]);
        let a = store.create(
            proposer,
            vec![action()],
            "first".into(),
            BlockHeight::new(10),
            BlockHeight::new(20),
        );
        let b = store.create(
            proposer,
            vec![action()],
            "second".into(),
            BlockHeight::new(11),
            BlockHeight::new(21),
        );
        assert_eq!(a, ProposalId::new(1));
        assert_eq!(b, ProposalId::new(2));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn fresh_record_has_empty_tallies() {
        let mut store = ProposalStore::new();
        let id = store.create(
            Address::new([1u8; 32]),
            vec![action()],
            "fresh".into(),
            BlockHeight::new(10),
            BlockHeight::new(20),
        );
        let p = store.get(id).unwrap();
        assert_eq!(p.for_votes, TokenAmount::ZERO);
        assert_eq!(p.eta, Timestamp::EPOCH);
        assert!(!p.canceled && !p.executed);
        assert!(p.receipts.is_empty());
    }

    #[test]
    fn snapshot_roundtrip_preserves_id_space() {
        let mut store = ProposalStore::new();
        store.create(
            Address::new([1u8; 32]),
            vec![action()],
            "persisted".into(),
            BlockHeight::new(10),
            BlockHeight::new(20),
        );
        let restored = ProposalStore::load_state(&store.save_state());
        assert_eq!(restored.count(), 1);
        // The id space continues where it left off.
        let mut restored = restored;
        let next = restored.create(
            Address::new([1u8; 32]),
            vec![action()],
            "next".into(),
            BlockHeight::new(30),
            BlockHeight::new(40),
        );
        assert_eq!(next, ProposalId::new(2));
    }

    #[test]
    fn load_state_from_garbage_starts_fresh() {
        let store = ProposalStore::load_state(b"not bincode");
        assert_eq!(store.count(), 0);
    }
}
