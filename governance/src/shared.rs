//! Shared-access wrapper enforcing the single-writer discipline.
//!
//! Mutating operations hold the write lock for their whole
//! validate-and-commit span; read-only queries share the read lock against
//! the last-committed state. Concurrent votes or delegation changes can
//! therefore never lose updates or double-count voting power.

use crate::authorizer::{Ed25519Scheme, SignatureScheme, SignedBallot, SignedDelegation};
use crate::engine::Governor;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::execution::CallDispatcher;
use crate::proposal::{Proposal, ProposalAction, ProposalId, ProposalState, Receipt};
use plenum_ledger::BalanceProvider;
use plenum_types::{Address, BlockHeight, Clock, Timestamp, TokenAmount};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A cloneable handle to a governor shared between threads.
pub struct SharedGovernor<B, D, S = Ed25519Scheme> {
    inner: Arc<RwLock<Governor<B, D, S>>>,
}

impl<B, D, S> Clone for SharedGovernor<B, D, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, D, S> SharedGovernor<B, D, S>
where
    B: BalanceProvider,
    D: CallDispatcher,
    S: SignatureScheme,
{
    pub fn new(governor: Governor<B, D, S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(governor)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Governor<B, D, S>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Governor<B, D, S>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Mutating operations (write lock) ─────────────────────────────────

    pub fn propose(
        &self,
        clock: Clock,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: impl Into<String>,
    ) -> Result<ProposalId, GovernanceError> {
        self.write().propose(clock, proposer, actions, description)
    }

    pub fn cast_vote(
        &self,
        clock: Clock,
        voter: Address,
        id: ProposalId,
        support: u8,
        reason: Option<String>,
    ) -> Result<TokenAmount, GovernanceError> {
        self.write().cast_vote(clock, voter, id, support, reason)
    }

    pub fn cast_vote_by_sig(
        &self,
        clock: Clock,
        id: ProposalId,
        support: u8,
        deadline: Timestamp,
        signed: &SignedBallot,
    ) -> Result<TokenAmount, GovernanceError> {
        self.write()
            .cast_vote_by_sig(clock, id, support, deadline, signed)
    }

    pub fn delegate(&self, delegator: Address, delegatee: Address) {
        self.write().delegate(delegator, delegatee)
    }

    pub fn delegate_by_sig(
        &self,
        clock: Clock,
        delegatee: Address,
        nonce: u64,
        expiry: Timestamp,
        signed: &SignedDelegation,
    ) -> Result<(), GovernanceError> {
        self.write()
            .delegate_by_sig(clock, delegatee, nonce, expiry, signed)
    }

    pub fn queue(&self, clock: Clock, id: ProposalId) -> Result<Timestamp, GovernanceError> {
        self.write().queue(clock, id)
    }

    pub fn execute(&self, clock: Clock, id: ProposalId) -> Result<(), GovernanceError> {
        self.write().execute(clock, id)
    }

    pub fn cancel(
        &self,
        clock: Clock,
        caller: Address,
        id: ProposalId,
    ) -> Result<(), GovernanceError> {
        self.write().cancel(clock, caller, id)
    }

    pub fn take_events(&self) -> Vec<GovernanceEvent> {
        self.write().take_events()
    }

    // ── Read-only queries (read lock) ────────────────────────────────────

    pub fn state(&self, clock: Clock, id: ProposalId) -> Result<ProposalState, GovernanceError> {
        self.read().state(clock, id)
    }

    pub fn get_votes(
        &self,
        clock: Clock,
        account: &Address,
        height: BlockHeight,
    ) -> Result<TokenAmount, GovernanceError> {
        self.read().get_votes(clock, account, height)
    }

    pub fn quorum(&self) -> TokenAmount {
        self.read().quorum()
    }

    pub fn get_receipt(&self, id: ProposalId, voter: &Address) -> Option<Receipt> {
        self.read().get_receipt(id, voter)
    }

    /// A snapshot copy of the proposal record.
    pub fn proposal(&self, id: ProposalId) -> Option<Proposal> {
        self.read().proposal(id).cloned()
    }

    pub fn delegate_of(&self, account: &Address) -> Address {
        self.read().delegate_of(account)
    }

    pub fn delegated_votes(&self, delegate: &Address) -> TokenAmount {
        self.read().delegated_votes(delegate)
    }

    pub fn nonce(&self, signer: &Address) -> u64 {
        self.read().nonce(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::RecordingDispatcher;
    use plenum_ledger::TokenLedger;
    use plenum_types::GovernanceConfig;
    use std::thread;

    fn account(seed: u8) -> Address {
        Address::new([seed; 32])
    }

    #[test]
    fn concurrent_votes_are_never_lost() {
        let ledger = Arc::new(TokenLedger::new());
        let proposer = account(1);
        ledger.mint(&proposer, TokenAmount::new(10_000)).unwrap();

        let voters: Vec<Address> = (10..26).map(account).collect();
        for voter in &voters {
            ledger.mint(voter, TokenAmount::new(100)).unwrap();
        }

        let governor = Governor::new(
            GovernanceConfig::default(),
            ledger,
            Arc::new(RecordingDispatcher::new()),
        )
        .expect("valid config");
        let shared = SharedGovernor::new(governor);

        let actions = vec![ProposalAction {
            target: account(2),
            value: TokenAmount::ZERO,
            signature: String::new(),
            calldata: vec![1],
        }];
        let id = shared
            .propose(Clock::at(10, 0), proposer, actions, "contended")
            .unwrap();

        let active = Clock::at(12, 0);
        thread::scope(|scope| {
            for voter in &voters {
                let shared = shared.clone();
                scope.spawn(move || {
                    shared.cast_vote(active, *voter, id, 1, None).unwrap();
                });
            }
        });

        let proposal = shared.proposal(id).unwrap();
        assert_eq!(
            proposal.for_votes,
            TokenAmount::new(100 * voters.len() as u128)
        );
        assert_eq!(proposal.receipts.len(), voters.len());
    }
}
