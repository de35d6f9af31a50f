mod error;
mod memory;
mod postgres;

pub use error::*;
pub use memory::*;
pub use postgres::*;

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Amount, TransferRecord};

/// SQL migration for the accounts table and the append-only transfer log
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Durable account storage and the transfer algorithm.
///
/// Implementations are the only writers of balances and of the transfer log.
/// Any implementation that locks two accounts must do so in
/// [`LockOrder`](crate::domain::LockOrder) order.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current committed state of an account.
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Insert a new account. The balance is stored as given.
    async fn create_account(
        &self,
        id: AccountId,
        initial_balance: Amount,
    ) -> Result<Account, StoreError>;

    /// Move `amount` from `source` to `destination` atomically and append
    /// one audit record. On error nothing is written.
    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<(), StoreError>;

    /// Audit records in insertion order, optionally only those touching `account`.
    async fn list_transfers(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<TransferRecord>, StoreError>;
}
