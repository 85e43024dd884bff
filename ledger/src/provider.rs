//! The balance-provider boundary consumed by the governance engine.

use plenum_types::{Address, TokenAmount};
use std::sync::Arc;

/// Read-only view of token balances.
///
/// The governance engine depends only on this trait; any backend (the
/// in-memory [`crate::TokenLedger`], a database, an RPC bridge) can stand
/// behind it. Both methods report **live** state — the engine's quorum and
/// voting-power reads are intentionally not snapshotted.
pub trait BalanceProvider {
    /// The account's current balance.
    fn balance_of(&self, account: &Address) -> TokenAmount;

    /// The current total token supply.
    fn total_supply(&self) -> TokenAmount;
}

impl<T: BalanceProvider + ?Sized> BalanceProvider for Arc<T> {
    fn balance_of(&self, account: &Address) -> TokenAmount {
        (**self).balance_of(account)
    }

    fn total_supply(&self) -> TokenAmount {
        (**self).total_supply()
    }
}

impl<T: BalanceProvider + ?Sized> BalanceProvider for &T {
    fn balance_of(&self, account: &Address) -> TokenAmount {
        (**self).balance_of(account)
    }

    fn total_supply(&self) -> TokenAmount {
        (**self).total_supply()
    }
}
