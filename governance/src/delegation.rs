//! Voting power accounting — direct balances plus delegated inflow.
//!
//! An account's effective power is the balance of its current delegate
//! (itself when undelegated) plus everything delegated *to* that delegate.
//! Aggregates move point-in-time: changing a delegation transfers the
//! delegator's balance as read at that moment; later balance changes do
//! not retroactively adjust any aggregate until the next delegation event.
//!
//! Despite taking a height parameter, `get_votes` reads live balance and
//! delegation state — the height only gates "not yet mined" queries. This
//! non-snapshotting behavior is deliberate (see DESIGN.md).

use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use plenum_ledger::BalanceProvider;
use plenum_types::{Address, BlockHeight, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Meta-store key used for persisting the voting power ledger state.
const VOTING_POWER_META_KEY: &str = "voting_power_ledger_state";

/// Tracks delegate assignments and per-delegate aggregated voting power.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VotingPowerLedger {
    /// delegator → delegatee. A zero delegatee means "cleared".
    delegates: HashMap<Address, Address>,
    /// delegate → aggregate delegated-in power.
    delegated_votes: HashMap<Address, TokenAmount>,
}

impl VotingPowerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The account's current delegate: itself when undelegated or cleared.
    pub fn delegate_of(&self, account: &Address) -> Address {
        match self.delegates.get(account) {
            Some(delegatee) if !delegatee.is_zero() => *delegatee,
            _ => *account,
        }
    }

    /// Aggregate power delegated to `delegate`.
    pub fn delegated_votes(&self, delegate: &Address) -> TokenAmount {
        self.delegated_votes
            .get(delegate)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// The account's effective voting power as of `height`.
    ///
    /// Fails unless `height < current` — power cannot be queried for the
    /// present or a future block.
    pub fn get_votes<B: BalanceProvider>(
        &self,
        balances: &B,
        account: &Address,
        height: BlockHeight,
        current: BlockHeight,
    ) -> Result<TokenAmount, GovernanceError> {
        if height >= current {
            return Err(GovernanceError::HeightNotMined {
                requested: height,
                current,
            });
        }
        let delegate = self.delegate_of(account);
        balances
            .balance_of(&delegate)
            .checked_add(self.delegated_votes(&delegate))
            .ok_or(GovernanceError::PowerOverflow)
    }

    /// Point the delegator's voting power at `delegatee`.
    ///
    /// Reads the delegator's balance once and moves exactly that amount
    /// between the affected aggregates. Returns the relationship event plus
    /// one event per aggregate that moved.
    pub fn delegate<B: BalanceProvider>(
        &mut self,
        balances: &B,
        delegator: &Address,
        delegatee: &Address,
    ) -> Vec<GovernanceEvent> {
        let old = self
            .delegates
            .get(delegator)
            .copied()
            .unwrap_or(Address::ZERO);
        let amount = balances.balance_of(delegator);

        let mut events = vec![GovernanceEvent::DelegateChanged {
            delegator: *delegator,
            from: old,
            to: *delegatee,
        }];

        if old != *delegatee && !amount.is_zero() {
            if !old.is_zero() {
                let previous = self.delegated_votes(&old);
                // The aggregate was funded at the *previous* delegation's
                // balance; the delegator may hold more now, so subtract
                // saturating rather than assuming the inflow still covers it.
                let current = previous.saturating_sub(amount);
                self.set_aggregate(&old, current);
                events.push(GovernanceEvent::DelegateVotesChanged {
                    delegate: old,
                    previous,
                    current,
                });
            }
            if !delegatee.is_zero() {
                let previous = self.delegated_votes(delegatee);
                let current = previous.saturating_add(amount);
                self.set_aggregate(delegatee, current);
                events.push(GovernanceEvent::DelegateVotesChanged {
                    delegate: *delegatee,
                    previous,
                    current,
                });
            }
        }

        self.delegates.insert(*delegator, *delegatee);
        events
    }

    fn set_aggregate(&mut self, delegate: &Address, amount: TokenAmount) {
        if amount.is_zero() {
            self.delegated_votes.remove(delegate);
        } else {
            self.delegated_votes.insert(*delegate, amount);
        }
    }

    /// Serialize the delegation graph to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore the delegation graph from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        bincode::deserialize(data).unwrap_or_default()
    }

    /// The meta-store key used for voting power persistence.
    pub fn meta_key() -> &'static str {
        VOTING_POWER_META_KEY
    }
}
