use thiserror::Error;

use super::{AccountId, Amount};

/// Input rejected before any storage access. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Account id must be set")]
    UnsetAccountId,

    #[error("Invalid account id: {0:?}")]
    InvalidAccountId(String),

    #[error("Source and destination must be different accounts (both are {0})")]
    SameAccount(AccountId),

    #[error("Amount is required")]
    MissingAmount,

    #[error("Malformed amount: {0:?}")]
    MalformedAmount(String),

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("Amount out of range (at most 20 integer digits and 8 decimal places): {0}")]
    AmountOutOfRange(String),

    #[error("Initial balance cannot be negative, got {0}")]
    NegativeBalance(Amount),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}
