//! Atomic batch execution of a proposal's actions.
//!
//! The engine never talks to the outside world directly — it prepares call
//! payloads and hands them to a [`CallDispatcher`], a transaction-style
//! boundary: `begin`, one `dispatch` per action in declared order, then
//! `commit` on full success or `rollback` on the first failure. Effects
//! staged between `begin` and `commit` must never become observable if the
//! batch aborts.

use crate::error::GovernanceError;
use crate::proposal::ProposalAction;
use plenum_crypto::blake2b_256;
use plenum_types::{Address, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A single action's dispatch failure, reported by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError(pub String);

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DispatchError {}

/// A fully prepared external call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCall {
    pub target: Address,
    pub value: TokenAmount,
    pub payload: Vec<u8>,
}

/// First 4 bytes of the Blake2b-256 hash of a function signature string.
pub fn call_selector(signature: &str) -> [u8; 4] {
    let digest = blake2b_256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Build the call payload for an action.
///
/// An empty signature means the calldata is already a complete payload and
/// is used verbatim; otherwise the selector is prepended to the calldata.
pub fn prepare_call(action: &ProposalAction) -> PreparedCall {
    let payload = if action.signature.is_empty() {
        action.calldata.clone()
    } else {
        let selector = call_selector(&action.signature);
        let mut payload = Vec::with_capacity(4 + action.calldata.len());
        payload.extend_from_slice(&selector);
        payload.extend_from_slice(&action.calldata);
        payload
    };
    PreparedCall {
        target: action.target,
        value: action.value,
        payload,
    }
}

/// The call-dispatch boundary.
///
/// Methods take `&self` so a dispatcher can be shared behind an `Arc`;
/// implementations serialize internally.
pub trait CallDispatcher {
    /// Open a batch. Effects staged after this call are provisional.
    fn begin(&self);

    /// Dispatch one prepared call. An error aborts the batch.
    fn dispatch(&self, call: &PreparedCall) -> Result<(), DispatchError>;

    /// Make the staged effects permanent.
    fn commit(&self);

    /// Discard all effects staged since `begin`.
    fn rollback(&self);
}

impl<T: CallDispatcher + ?Sized> CallDispatcher for Arc<T> {
    fn begin(&self) {
        (**self).begin()
    }

    fn dispatch(&self, call: &PreparedCall) -> Result<(), DispatchError> {
        (**self).dispatch(call)
    }

    fn commit(&self) {
        (**self).commit()
    }

    fn rollback(&self) {
        (**self).rollback()
    }
}

/// Dispatch a proposal's actions as one atomic batch.
///
/// Actions run in declared order; the first failure rolls the whole batch
/// back and surfaces as [`GovernanceError::ActionFailed`] with the failing
/// index.
pub fn dispatch_batch<D: CallDispatcher>(
    dispatcher: &D,
    actions: &[ProposalAction],
) -> Result<(), GovernanceError> {
    dispatcher.begin();
    for (index, action) in actions.iter().enumerate() {
        let call = prepare_call(action);
        if let Err(err) = dispatcher.dispatch(&call) {
            dispatcher.rollback();
            return Err(GovernanceError::ActionFailed {
                index,
                reason: err.to_string(),
            });
        }
    }
    dispatcher.commit();
    Ok(())
}

#[derive(Default)]
struct RecorderState {
    staged: Vec<PreparedCall>,
    committed: Vec<PreparedCall>,
    fail_at: Option<usize>,
}

/// An in-memory transactional dispatcher for tests and embedders without a
/// real call surface.
///
/// Calls staged between `begin` and `commit` become visible through
/// [`RecordingDispatcher::committed`]; `fail_at` arms a failure at the
/// given action index.
#[derive(Default)]
pub struct RecordingDispatcher {
    state: Mutex<RecorderState>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the dispatch of the action at `index` in the next batch.
    pub fn fail_at(&self, index: usize) {
        self.lock().fail_at = Some(index);
    }

    /// Disarm a previously programmed failure.
    pub fn clear_failure(&self) {
        self.lock().fail_at = None;
    }

    /// All calls from committed batches, in dispatch order.
    pub fn committed(&self) -> Vec<PreparedCall> {
        self.lock().committed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CallDispatcher for RecordingDispatcher {
    fn begin(&self) {
        self.lock().staged.clear();
    }

    fn dispatch(&self, call: &PreparedCall) -> Result<(), DispatchError> {
        let mut state = self.lock();
        if state.fail_at == Some(state.staged.len()) {
            return Err(DispatchError(format!(
                "programmed failure at action {}",
                state.staged.len()
            )));
        }
        state.staged.push(call.clone());
        Ok(())
    }

    fn commit(&self) {
        let mut state = self.lock();
        let staged = std::mem::take(&mut state.staged);
        state.committed.extend(staged);
    }

    fn rollback(&self) {
        self.lock().staged.clear();
    }
}
