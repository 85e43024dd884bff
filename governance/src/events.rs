//! Observable governance transitions.
//!
//! Each event fires exactly once per corresponding successful transition.
//! The engine appends them to its in-memory log (drained with
//! `Governor::take_events`) and mirrors each one as a `tracing` record for
//! audit/indexing pipelines.

use crate::proposal::{ProposalId, VoteSupport};
use plenum_types::{Address, BlockHeight, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        start_height: BlockHeight,
        end_height: BlockHeight,
        description: String,
    },
    VoteCast {
        id: ProposalId,
        voter: Address,
        support: VoteSupport,
        votes: TokenAmount,
        reason: Option<String>,
    },
    ProposalCanceled {
        id: ProposalId,
    },
    ProposalQueued {
        id: ProposalId,
        eta: Timestamp,
    },
    ProposalExecuted {
        id: ProposalId,
    },
    DelegateChanged {
        delegator: Address,
        from: Address,
        to: Address,
    },
    DelegateVotesChanged {
        delegate: Address,
        previous: TokenAmount,
        current: TokenAmount,
    },
}

impl GovernanceEvent {
    pub(crate) fn trace(&self) {
        match self {
            Self::ProposalCreated {
                id,
                proposer,
                start_height,
                end_height,
                ..
            } => tracing::info!(
                %id, %proposer, %start_height, %end_height,
                "proposal created"
            ),
            Self::VoteCast {
                id,
                voter,
                support,
                votes,
                ..
            } => tracing::info!(%id, %voter, ?support, %votes, "vote cast"),
            Self::ProposalCanceled { id } => tracing::info!(%id, "proposal canceled"),
            Self::ProposalQueued { id, eta } => tracing::info!(%id, %eta, "proposal queued"),
            Self::ProposalExecuted { id } => tracing::info!(%id, "proposal executed"),
            Self::DelegateChanged {
                delegator,
                from,
                to,
            } => tracing::info!(%delegator, %from, %to, "delegate changed"),
            Self::DelegateVotesChanged {
                delegate,
                previous,
                current,
            } => tracing::info!(%delegate, %previous, %current, "delegate voting power changed"),
        }
    }
}
