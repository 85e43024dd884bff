//! The governance engine — entry points for every lifecycle operation.
//!
//! All mutating methods take `&mut self`: exclusive access is the
//! single-writer discipline, and every operation validates completely
//! before touching state, so a failure leaves nothing behind. The one
//! operation with an external effect — `execute` — stages its calls
//! through the dispatcher's transaction boundary and rolls back on any
//! action failure.

use crate::authorizer::{
    Ballot, Delegation, Ed25519Scheme, SignatureAuthorizer, SignatureScheme, SignedBallot,
    SignedDelegation,
};
use crate::delegation::VotingPowerLedger;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::execution::{dispatch_batch, CallDispatcher};
use crate::proposal::{Proposal, ProposalAction, ProposalId, ProposalState, Receipt, VoteSupport};
use crate::store::ProposalStore;
use plenum_ledger::BalanceProvider;
use plenum_types::{
    Address, BlockHeight, Clock, ConfigError, GovernanceConfig, Timestamp, TokenAmount,
};

/// The governance engine.
///
/// Generic over its three collaborators: the balance provider `B`, the
/// call dispatcher `D`, and the signature scheme `S` (Ed25519 unless a
/// test substitutes its own).
pub struct Governor<B, D, S = Ed25519Scheme> {
    config: GovernanceConfig,
    store: ProposalStore,
    power: VotingPowerLedger,
    authorizer: SignatureAuthorizer<S>,
    balances: B,
    dispatcher: D,
    events: Vec<GovernanceEvent>,
}

impl<B, D> Governor<B, D>
where
    B: BalanceProvider,
    D: CallDispatcher,
{
    /// Build a governor with the production Ed25519 scheme.
    pub fn new(config: GovernanceConfig, balances: B, dispatcher: D) -> Result<Self, ConfigError> {
        Self::with_scheme(config, balances, dispatcher, Ed25519Scheme)
    }
}

impl<B, D, S> Governor<B, D, S>
where
    B: BalanceProvider,
    D: CallDispatcher,
    S: SignatureScheme,
{
    /// Build a governor with an explicit signature scheme.
    pub fn with_scheme(
        config: GovernanceConfig,
        balances: B,
        dispatcher: D,
        scheme: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store: ProposalStore::new(),
            power: VotingPowerLedger::new(),
            authorizer: SignatureAuthorizer::new(scheme),
            balances,
            dispatcher,
            events: Vec::new(),
        })
    }

    // ── Proposal creation ────────────────────────────────────────────────

    /// Create a proposal from a batch of actions.
    ///
    /// The proposer's voting power at the immediately preceding height must
    /// meet the proposal threshold. The voting window is computed from the
    /// config: opens `voting_delay` blocks out, stays open `voting_period`
    /// blocks.
    pub fn propose(
        &mut self,
        clock: Clock,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: impl Into<String>,
    ) -> Result<ProposalId, GovernanceError> {
        self.ensure_unpaused()?;
        let count = actions.len();
        if count == 0 || count > GovernanceConfig::MAX_PROPOSAL_ACTIONS {
            return Err(GovernanceError::ActionCountOutOfRange {
                got: count,
                max: GovernanceConfig::MAX_PROPOSAL_ACTIONS,
            });
        }
        let power =
            self.power
                .get_votes(&self.balances, &proposer, clock.height.prev(), clock.height)?;
        if power < self.config.proposal_threshold {
            return Err(GovernanceError::BelowProposalThreshold {
                have: power,
                need: self.config.proposal_threshold,
            });
        }
        let start_height = clock.height.offset(self.config.voting_delay);
        let end_height = start_height.offset(self.config.voting_period);
        let description = description.into();
        let id = self.store.create(
            proposer,
            actions,
            description.clone(),
            start_height,
            end_height,
        );
        self.record(GovernanceEvent::ProposalCreated {
            id,
            proposer,
            start_height,
            end_height,
            description,
        });
        Ok(id)
    }

    /// Parallel-array form of [`Governor::propose`].
    ///
    /// The four arrays must have matching lengths; they are zipped into
    /// action tuples before the usual validation.
    #[allow(clippy::too_many_arguments)]
    pub fn propose_raw(
        &mut self,
        clock: Clock,
        proposer: Address,
        targets: Vec<Address>,
        values: Vec<TokenAmount>,
        signatures: Vec<String>,
        calldatas: Vec<Vec<u8>>,
        description: impl Into<String>,
    ) -> Result<ProposalId, GovernanceError> {
        let len = targets.len();
        if values.len() != len || signatures.len() != len || calldatas.len() != len {
            return Err(GovernanceError::ActionArityMismatch);
        }
        let actions = targets
            .into_iter()
            .zip(values)
            .zip(signatures)
            .zip(calldatas)
            .map(|(((target, value), signature), calldata)| ProposalAction {
                target,
                value,
                signature,
                calldata,
            })
            .collect();
        self.propose(clock, proposer, actions, description)
    }

    // ── Voting ───────────────────────────────────────────────────────────

    /// Cast a direct vote. Returns the recorded weight.
    pub fn cast_vote(
        &mut self,
        clock: Clock,
        voter: Address,
        id: ProposalId,
        support: u8,
        reason: Option<String>,
    ) -> Result<TokenAmount, GovernanceError> {
        self.ensure_unpaused()?;
        self.apply_vote(clock, voter, id, support, reason, false)
    }

    /// Cast a vote authorized by a detached signature.
    ///
    /// The signed payload binds the proposal id, support code, the
    /// signer's nonce and the deadline. The nonce is consumed only if the
    /// whole vote goes through.
    pub fn cast_vote_by_sig(
        &mut self,
        clock: Clock,
        id: ProposalId,
        support: u8,
        deadline: Timestamp,
        signed: &SignedBallot,
    ) -> Result<TokenAmount, GovernanceError> {
        self.ensure_unpaused()?;
        let ballot = Ballot {
            proposal_id: id,
            support,
            nonce: signed.nonce,
            deadline,
        };
        let voter =
            self.authorizer
                .verify_ballot(&ballot, &signed.signer, &signed.signature, clock.time)?;
        self.apply_vote(clock, voter, id, support, None, true)
    }

    fn apply_vote(
        &mut self,
        clock: Clock,
        voter: Address,
        id: ProposalId,
        support: u8,
        reason: Option<String>,
        consume_nonce: bool,
    ) -> Result<TokenAmount, GovernanceError> {
        let choice = VoteSupport::from_code(support).ok_or(GovernanceError::InvalidSupport(support))?;
        let quorum = self.quorum();
        let grace = self.config.grace_period;
        let proposal = self
            .store
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let actual = proposal.state(clock, quorum, grace);
        if actual != ProposalState::Active {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalState::Active,
                actual,
            });
        }
        if proposal.has_voted(&voter) {
            return Err(GovernanceError::AlreadyVoted { id, voter });
        }
        let start_height = proposal.start_height;
        // Weight is the delegate-aggregated power evaluated at the
        // proposal's own start height parameter, fixed at cast time.
        let weight = self
            .power
            .get_votes(&self.balances, &voter, start_height, clock.height)?;
        if weight.is_zero() {
            return Err(GovernanceError::NoVotingPower { id, voter });
        }
        if consume_nonce {
            self.authorizer.consume_nonce(&voter);
        }
        let proposal = self
            .store
            .get_mut(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        match choice {
            VoteSupport::Against => {
                proposal.against_votes = proposal.against_votes.saturating_add(weight)
            }
            VoteSupport::For => proposal.for_votes = proposal.for_votes.saturating_add(weight),
            VoteSupport::Abstain => {
                proposal.abstain_votes = proposal.abstain_votes.saturating_add(weight)
            }
        }
        proposal.receipts.insert(
            voter,
            Receipt {
                support: choice,
                votes: weight,
            },
        );
        self.record(GovernanceEvent::VoteCast {
            id,
            voter,
            support: choice,
            votes: weight,
            reason,
        });
        Ok(weight)
    }

    // ── Delegation ───────────────────────────────────────────────────────

    /// Point the delegator's voting power at `delegatee` (zero to clear).
    ///
    /// Not gated on the pause flag.
    pub fn delegate(&mut self, delegator: Address, delegatee: Address) {
        let events = self.power.delegate(&self.balances, &delegator, &delegatee);
        for event in events {
            self.record(event);
        }
    }

    /// Delegate on behalf of a signer, authorized by a detached signature.
    pub fn delegate_by_sig(
        &mut self,
        clock: Clock,
        delegatee: Address,
        nonce: u64,
        expiry: Timestamp,
        signed: &SignedDelegation,
    ) -> Result<(), GovernanceError> {
        let payload = Delegation {
            delegatee,
            nonce,
            expiry,
        };
        let delegator = self.authorizer.verify_delegation(
            &payload,
            &signed.signer,
            &signed.signature,
            clock.time,
        )?;
        self.authorizer.consume_nonce(&delegator);
        let events = self.power.delegate(&self.balances, &delegator, &delegatee);
        for event in events {
            self.record(event);
        }
        Ok(())
    }

    // ── Queue / execute / cancel ─────────────────────────────────────────

    /// Queue a succeeded proposal for execution. Returns the stamped eta.
    pub fn queue(&mut self, clock: Clock, id: ProposalId) -> Result<Timestamp, GovernanceError> {
        self.ensure_unpaused()?;
        let quorum = self.quorum();
        let grace = self.config.grace_period;
        let proposal = self
            .store
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let actual = proposal.state(clock, quorum, grace);
        if actual != ProposalState::Succeeded {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalState::Succeeded,
                actual,
            });
        }
        let eta = clock.time.offset(self.config.timelock_delay);
        if let Some(proposal) = self.store.get_mut(id) {
            proposal.eta = eta;
        }
        self.record(GovernanceEvent::ProposalQueued { id, eta });
        Ok(eta)
    }

    /// Execute a queued proposal's action batch atomically.
    ///
    /// Requires the timelock to have elapsed; the grace bound is enforced
    /// by the state gate (a lapsed proposal derives `Expired`, not
    /// `Queued`). Any action failure rolls the whole batch back.
    pub fn execute(&mut self, clock: Clock, id: ProposalId) -> Result<(), GovernanceError> {
        self.ensure_unpaused()?;
        let quorum = self.quorum();
        let grace = self.config.grace_period;
        let proposal = self
            .store
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let actual = proposal.state(clock, quorum, grace);
        if actual != ProposalState::Queued {
            return Err(GovernanceError::InvalidState {
                id,
                expected: ProposalState::Queued,
                actual,
            });
        }
        let eta = proposal.eta;
        if clock.time < eta {
            return Err(GovernanceError::TimelockNotReached {
                eta,
                now: clock.time,
            });
        }
        let actions = proposal.actions.clone();
        // The flag flips before dispatch: a re-entrant observer derives
        // Executed rather than Queued. Rolled back if the batch aborts.
        if let Some(proposal) = self.store.get_mut(id) {
            proposal.executed = true;
        }
        match dispatch_batch(&self.dispatcher, &actions) {
            Ok(()) => {
                self.record(GovernanceEvent::ProposalExecuted { id });
                Ok(())
            }
            Err(err) => {
                if let Some(proposal) = self.store.get_mut(id) {
                    proposal.executed = false;
                }
                tracing::warn!(%id, error = %err, "proposal execution aborted");
                Err(err)
            }
        }
    }

    /// Cancel a proposal.
    ///
    /// Permitted for the original proposer, the guardian, or anyone once
    /// the proposer's current power has fallen below the threshold.
    /// Rejected only when the proposal has already been executed — a
    /// `Succeeded` or `Queued` proposal can still be canceled. Available
    /// while paused.
    pub fn cancel(
        &mut self,
        clock: Clock,
        caller: Address,
        id: ProposalId,
    ) -> Result<(), GovernanceError> {
        let quorum = self.quorum();
        let grace = self.config.grace_period;
        let proposal = self
            .store
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.state(clock, quorum, grace) == ProposalState::Executed {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        let proposer = proposal.proposer;
        let already_canceled = proposal.canceled;
        let authorized = caller == proposer
            || (!self.config.guardian.is_zero() && caller == self.config.guardian)
            || self.proposer_below_threshold(clock, &proposer)?;
        if !authorized {
            return Err(GovernanceError::UnauthorizedCancel { id, caller });
        }
        // Canceling twice is accepted but is not a transition, so the
        // event fires only the first time.
        if already_canceled {
            return Ok(());
        }
        if let Some(proposal) = self.store.get_mut(id) {
            proposal.canceled = true;
        }
        self.record(GovernanceEvent::ProposalCanceled { id });
        Ok(())
    }

    fn proposer_below_threshold(
        &self,
        clock: Clock,
        proposer: &Address,
    ) -> Result<bool, GovernanceError> {
        let power =
            self.power
                .get_votes(&self.balances, proposer, clock.height.prev(), clock.height)?;
        Ok(power < self.config.proposal_threshold)
    }

    // ── Read-only queries ────────────────────────────────────────────────

    /// Derive the proposal's current lifecycle state.
    pub fn state(&self, clock: Clock, id: ProposalId) -> Result<ProposalState, GovernanceError> {
        let proposal = self
            .store
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        Ok(proposal.state(clock, self.quorum(), self.config.grace_period))
    }

    /// Effective voting power of `account` as of `height`.
    pub fn get_votes(
        &self,
        clock: Clock,
        account: &Address,
        height: BlockHeight,
    ) -> Result<TokenAmount, GovernanceError> {
        self.power
            .get_votes(&self.balances, account, height, clock.height)
    }

    /// The current quorum bar, from the **live** token supply.
    pub fn quorum(&self) -> TokenAmount {
        self.balances
            .total_supply()
            .percent(self.config.quorum_percentage)
    }

    pub fn get_receipt(&self, id: ProposalId, voter: &Address) -> Option<Receipt> {
        self.store.get(id).and_then(|p| p.receipt(voter))
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.store.get(id)
    }

    /// The proposal's action batch in declared order.
    pub fn actions(&self, id: ProposalId) -> Option<&[ProposalAction]> {
        self.store.get(id).map(|p| p.actions.as_slice())
    }

    /// The account's current delegate (itself when undelegated).
    pub fn delegate_of(&self, account: &Address) -> Address {
        self.power.delegate_of(account)
    }

    /// Aggregate power delegated to `delegate`.
    pub fn delegated_votes(&self, delegate: &Address) -> TokenAmount {
        self.power.delegated_votes(delegate)
    }

    /// The signer's next expected nonce.
    pub fn nonce(&self, signer: &Address) -> u64 {
        self.authorizer.nonce(signer)
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GovernanceConfig {
        &mut self.config
    }

    pub fn balances(&self) -> &B {
        &self.balances
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Events recorded so far, in emission order.
    pub fn events(&self) -> &[GovernanceEvent] {
        &self.events
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_unpaused(&self) -> Result<(), GovernanceError> {
        if self.config.paused {
            Err(GovernanceError::Paused)
        } else {
            Ok(())
        }
    }

    fn record(&mut self, event: GovernanceEvent) {
        event.trace();
        self.events.push(event);
    }
}
