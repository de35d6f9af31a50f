use std::time::Duration;

use thiserror::Error;

use crate::domain::{AccountId, Amount, ValidationError};
use crate::storage::{StoreError, TxStage};

/// Outcome kinds reported to callers. Mirrors [`StoreError`] one to one,
/// plus the service's own validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Amount,
        required: Amount,
    },

    #[error("Transfer would push the balance of account {0} out of range")]
    BalanceOverflow(AccountId),

    #[error("Could not create account {account_id}: {reason}")]
    AccountCreationFailed { account_id: AccountId, reason: String },

    #[error("Account {0} disappeared while the transfer was being applied")]
    AccountVanished(AccountId),

    #[error("Transfer conflicted with a concurrent transfer, retry: {0}")]
    Conflict(String),

    #[error("Ledger is busy, retry later")]
    Busy,

    #[error("Ledger operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ledger failure during {stage}: {message}")]
    Storage { stage: TxStage, message: String },
}

impl AppError {
    /// Failures caused by the request itself rather than the server.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::AccountNotFound(_)
                | AppError::AccountAlreadyExists(_)
                | AppError::InsufficientFunds { .. }
                | AppError::BalanceOverflow(_)
        )
    }

    /// True when the caller may retry the whole operation from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Conflict(_) | AppError::Busy | AppError::Timeout(_)
        )
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(e) => AppError::Validation(e),
            StoreError::AccountNotFound(id) => AppError::AccountNotFound(id),
            StoreError::DuplicateAccount(id) => AppError::AccountAlreadyExists(id),
            StoreError::AccountCreationFailed { account_id, reason } => {
                AppError::AccountCreationFailed { account_id, reason }
            }
            StoreError::InsufficientFunds {
                account_id,
                balance,
                required,
            } => AppError::InsufficientFunds {
                account_id,
                balance,
                required,
            },
            StoreError::BalanceOverflow(id) => AppError::BalanceOverflow(id),
            StoreError::AccountNotFoundDuringUpdate(id) => AppError::AccountVanished(id),
            StoreError::SerializationConflict(message) => AppError::Conflict(message),
            StoreError::PoolExhausted => AppError::Busy,
            StoreError::Timeout(after) => AppError::Timeout(after),
            StoreError::Transaction { stage, message } => AppError::Storage { stage, message },
        }
    }
}
