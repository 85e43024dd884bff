//! Governance for Plenum: the proposal lifecycle engine.
//!
//! Proposals carry a batch of external calls through a derived state
//! machine — Pending → Active → Succeeded/Defeated → Queued → Executed,
//! with Canceled and Expired as the off-ramps. Voting power is token
//! balance plus delegated inflow; ballots and delegations can be
//! authorized by detached, replay-protected typed signatures; execution is
//! timelocked, grace-bounded, and all-or-nothing.
//!
//! The engine is deterministic and clock-driven: every operation takes the
//! caller's [`plenum_types::Clock`], and all time-based transitions are
//! derived lazily — nothing fires in the background.

pub mod authorizer;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod events;
pub mod execution;
pub mod proposal;
pub mod shared;
pub mod store;

pub use authorizer::{
    sign_ballot, sign_delegation, Ballot, Delegation, Ed25519Scheme, SignatureAuthorizer,
    SignatureScheme, SignedBallot, SignedDelegation,
};
pub use delegation::VotingPowerLedger;
pub use engine::Governor;
pub use error::{ErrorKind, GovernanceError};
pub use events::GovernanceEvent;
pub use execution::{
    call_selector, prepare_call, CallDispatcher, DispatchError, PreparedCall, RecordingDispatcher,
};
pub use proposal::{Proposal, ProposalAction, ProposalId, ProposalState, Receipt, VoteSupport};
pub use shared::SharedGovernor;
pub use store::ProposalStore;
