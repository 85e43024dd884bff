//! In-memory token ledger.

use crate::error::LedgerError;
use crate::provider::BalanceProvider;
use plenum_types::{Address, TokenAmount};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Book {
    balances: HashMap<Address, TokenAmount>,
    total_supply: TokenAmount,
}

/// A thread-safe in-memory token ledger.
///
/// Mutation methods take `&self` so a single ledger can be shared (behind
/// an `Arc`) between the governance engine and whatever mints or moves
/// tokens around it. Every mutation is checked-then-committed; a failed
/// operation leaves no trace.
pub struct TokenLedger {
    book: RwLock<Book>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self {
            book: RwLock::new(Book::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Book> {
        self.book.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Book> {
        self.book.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new tokens in `account`.
    pub fn mint(&self, account: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut book = self.write();
        let balance = book.balances.get(account).copied().unwrap_or(TokenAmount::ZERO);
        let new_balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        let new_supply = book
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        book.balances.insert(*account, new_balance);
        book.total_supply = new_supply;
        tracing::debug!(%account, %amount, "tokens minted");
        Ok(())
    }

    /// Destroy `amount` tokens held by `account`.
    pub fn burn(&self, account: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        let mut book = self.write();
        let balance = book.balances.get(account).copied().unwrap_or(TokenAmount::ZERO);
        let new_balance = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount.raw(),
                available: balance.raw(),
            })?;
        book.balances.insert(*account, new_balance);
        book.total_supply = book.total_supply.saturating_sub(amount);
        tracing::debug!(%account, %amount, "tokens burned");
        Ok(())
    }

    /// Move `amount` tokens from `from` to `to`.
    pub fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let mut book = self.write();
        let from_balance = book.balances.get(from).copied().unwrap_or(TokenAmount::ZERO);
        let to_balance = book.balances.get(to).copied().unwrap_or(TokenAmount::ZERO);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount.raw(),
                available: from_balance.raw(),
            })?;
        let new_to = to_balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        book.balances.insert(*from, new_from);
        book.balances.insert(*to, new_to);
        Ok(())
    }
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceProvider for TokenLedger {
    fn balance_of(&self, account: &Address) -> TokenAmount {
        self.read()
            .balances
            .get(account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    fn total_supply(&self) -> TokenAmount {
        self.read().total_supply
    }
}
