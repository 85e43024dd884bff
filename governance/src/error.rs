//! Governance errors.
//!
//! Every error is synchronous and non-retryable by the engine itself; the
//! caller may retry only after correcting the condition. Each variant maps
//! into one of the six [`ErrorKind`] categories, which tests and callers
//! use for coarse classification.

use crate::proposal::{ProposalId, ProposalState};
use plenum_types::{Address, BlockHeight, Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    // ── Validation ───────────────────────────────────────────────────────
    #[error("a proposal must carry between 1 and {max} actions, got {got}")]
    ActionCountOutOfRange { got: usize, max: usize },

    #[error("proposal action arrays must have matching lengths")]
    ActionArityMismatch,

    #[error("invalid support code {0}: expected 0 (against), 1 (for) or 2 (abstain)")]
    InvalidSupport(u8),

    #[error("{voter} has already voted on {id}")]
    AlreadyVoted { id: ProposalId, voter: Address },

    #[error("{voter} carries no voting power for {id}")]
    NoVotingPower { id: ProposalId, voter: Address },

    #[error("voting power arithmetic overflow")]
    PowerOverflow,

    // ── Authorization ────────────────────────────────────────────────────
    #[error("proposer power {have} is below the proposal threshold {need}")]
    BelowProposalThreshold { have: TokenAmount, need: TokenAmount },

    #[error("{caller} may not cancel {id}")]
    UnauthorizedCancel { id: ProposalId, caller: Address },

    #[error("governance is paused")]
    Paused,

    #[error("signature verification failed")]
    InvalidSignature,

    // ── State ────────────────────────────────────────────────────────────
    #[error("{0} not found")]
    ProposalNotFound(ProposalId),

    #[error("{id} is {actual:?}, operation requires {expected:?}")]
    InvalidState {
        id: ProposalId,
        expected: ProposalState,
        actual: ProposalState,
    },

    #[error("{0} has already been executed")]
    AlreadyExecuted(ProposalId),

    // ── Temporal ─────────────────────────────────────────────────────────
    #[error("signature deadline {deadline} has passed (now {now})")]
    SignatureExpired { deadline: Timestamp, now: Timestamp },

    #[error("timelock not reached: eta {eta}, now {now}")]
    TimelockNotReached { eta: Timestamp, now: Timestamp },

    #[error("voting power for {requested} is not yet determined at {current}")]
    HeightNotMined {
        requested: BlockHeight,
        current: BlockHeight,
    },

    // ── Replay ───────────────────────────────────────────────────────────
    #[error("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: u64, got: u64 },

    // ── Execution ────────────────────────────────────────────────────────
    #[error("action {index} failed during execution: {reason}")]
    ActionFailed { index: usize, reason: String },
}

/// Coarse classification of a [`GovernanceError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    Temporal,
    Replay,
    Execution,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            ActionCountOutOfRange { .. }
            | ActionArityMismatch
            | InvalidSupport(_)
            | AlreadyVoted { .. }
            | NoVotingPower { .. }
            | PowerOverflow => ErrorKind::Validation,
            BelowProposalThreshold { .. }
            | UnauthorizedCancel { .. }
            | Paused
            | InvalidSignature => ErrorKind::Authorization,
            ProposalNotFound(_) | InvalidState { .. } | AlreadyExecuted(_) => ErrorKind::State,
            SignatureExpired { .. } | TimelockNotReached { .. } | HeightNotMined { .. } => {
                ErrorKind::Temporal
            }
            NonceMismatch { .. } => ErrorKind::Replay,
            ActionFailed { .. } => ErrorKind::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(GovernanceError::Paused.kind(), ErrorKind::Authorization);
        assert_eq!(
            GovernanceError::NonceMismatch { expected: 1, got: 0 }.kind(),
            ErrorKind::Replay
        );
        assert_eq!(
            GovernanceError::ActionFailed {
                index: 0,
                reason: "reverted".into()
            }
            .kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            GovernanceError::InvalidSupport(3).kind(),
            ErrorKind::Validation
        );
    }
}
