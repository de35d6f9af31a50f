use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{AccountId, Amount, SettlementError, ValidationError};

/// Phase of a store operation in which an infrastructure failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Read,
    Begin,
    Lock,
    Update,
    Audit,
    Commit,
}

impl TxStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStage::Read => "read",
            TxStage::Begin => "begin",
            TxStage::Lock => "lock",
            TxStage::Update => "update",
            TxStage::Audit => "audit",
            TxStage::Commit => "commit",
        }
    }
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every way a [`LedgerStore`](super::LedgerStore) operation can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    DuplicateAccount(AccountId),

    #[error("Failed to create account {account_id}: {reason}")]
    AccountCreationFailed { account_id: AccountId, reason: String },

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Amount,
        required: Amount,
    },

    #[error("Balance of account {0} would leave the representable range")]
    BalanceOverflow(AccountId),

    #[error("Account {0} not found or no balance updated")]
    AccountNotFoundDuringUpdate(AccountId),

    #[error("Transaction could not be serialized: {0}")]
    SerializationConflict(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transaction failed during {stage}: {message}")]
    Transaction { stage: TxStage, message: String },
}

impl StoreError {
    /// True when retrying the whole operation from scratch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::SerializationConflict(_) | StoreError::PoolExhausted | StoreError::Timeout(_)
        )
    }

    pub(crate) fn settlement(
        err: SettlementError,
        source: AccountId,
        amount: Amount,
    ) -> Self {
        match err {
            SettlementError::InsufficientFunds { balance } => StoreError::InsufficientFunds {
                account_id: source,
                balance,
                required: amount,
            },
            SettlementError::BalanceOverflow(id) => StoreError::BalanceOverflow(id),
        }
    }

    pub(crate) fn transaction(stage: TxStage, message: impl Into<String>) -> Self {
        StoreError::Transaction {
            stage,
            message: message.into(),
        }
    }
}
