use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("the zero address cannot hold a balance")]
    ZeroAddress,

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("balance arithmetic overflow")]
    Overflow,
}
