//! Proposals and their lifecycle.
//!
//! A proposal's state is never stored — it is derived on demand from the
//! stored fields and the caller's clock by [`Proposal::state`], a pure
//! first-match-wins cascade. Only `canceled`, `executed`, `eta` and the
//! vote tallies are ever written after creation.

use plenum_types::{Address, BlockHeight, Clock, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A proposal identifier. Allocated sequentially starting at 1; never
/// reused or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proposal {}", self.0)
    }
}

/// A vote choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl VoteSupport {
    /// Decode a wire support code. Anything outside {0, 1, 2} is invalid.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Against),
            1 => Some(Self::For),
            2 => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Against => 0,
            Self::For => 1,
            Self::Abstain => 2,
        }
    }
}

/// One external call in a proposal's batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAction {
    /// The call target.
    pub target: Address,
    /// Token value attached to the call.
    pub value: TokenAmount,
    /// Function signature string. Empty means the calldata is a complete
    /// payload already.
    pub signature: String,
    /// ABI-style argument bytes.
    pub calldata: Vec<u8>,
}

/// A voter's recorded choice and weight for one proposal.
///
/// Created on first vote, immutable thereafter — there is no vote change
/// or retraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub support: VoteSupport,
    pub votes: TokenAmount,
}

/// The derived lifecycle state of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    /// Terminal states admit no further state-changing operation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::Defeated | Self::Expired | Self::Executed
        )
    }
}

/// A governance proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    /// Ordered batch of external calls (1–10 entries).
    pub actions: Vec<ProposalAction>,
    pub description: String,
    /// Voting opens strictly after this height.
    pub start_height: BlockHeight,
    /// Voting closes strictly after this height.
    pub end_height: BlockHeight,
    pub for_votes: TokenAmount,
    pub against_votes: TokenAmount,
    pub abstain_votes: TokenAmount,
    pub canceled: bool,
    pub executed: bool,
    /// Earliest execution time. `Timestamp::EPOCH` until queued.
    pub eta: Timestamp,
    /// Per-voter receipts; presence means the voter has voted.
    pub receipts: HashMap<Address, Receipt>,
}

impl Proposal {
    /// Derive the lifecycle state at `clock`.
    ///
    /// First match wins; the ordering is part of the contract. `quorum` is
    /// the current bar (computed from **live** supply by the caller) and
    /// compares against `for_votes` only — against/abstain votes do not
    /// count toward quorum.
    pub fn state(&self, clock: Clock, quorum: TokenAmount, grace_period: u64) -> ProposalState {
        if self.canceled {
            ProposalState::Canceled
        } else if clock.height <= self.start_height {
            ProposalState::Pending
        } else if clock.height <= self.end_height {
            ProposalState::Active
        } else if self.for_votes <= self.against_votes || self.for_votes < quorum {
            ProposalState::Defeated
        } else if self.eta == Timestamp::EPOCH {
            ProposalState::Succeeded
        } else if self.executed {
            ProposalState::Executed
        } else if self.eta.has_expired(grace_period, clock.time) {
            ProposalState::Expired
        } else {
            ProposalState::Queued
        }
    }

    pub fn receipt(&self, voter: &Address) -> Option<Receipt> {
        self.receipts.get(voter).copied()
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.receipts.contains_key(voter)
    }
}
