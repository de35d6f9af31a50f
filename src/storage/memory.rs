use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::domain::{
    Account, AccountId, Amount, LockOrder, TransferRecord, UNSET_ACCOUNT_ID, check_amount_range,
    settle, validate_transfer,
};

use super::{LedgerStore, StoreError, TxStage};

/// A balance guarded like a database row: holding the lock is holding the row lock.
type Row = Arc<Mutex<Amount>>;

/// In-process ledger used as a test double and for local demos.
///
/// Follows the same protocol as the PostgreSQL store: rows are locked in
/// [`LockOrder`], funds are checked under the lock, both balances and the
/// audit record are written together or not at all.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: RwLock<BTreeMap<AccountId, Row>>,
    transfers: Mutex<Vec<TransferRecord>>,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next transfer fail after its debit and credit have been
    /// written, before the audit record is appended. The store then rolls
    /// both balances back.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Sum of all balances. Not a snapshot: only meaningful while no transfer
    /// is in flight.
    pub async fn total_balance(&self) -> Amount {
        let rows: Vec<Row> = self.accounts.read().await.values().cloned().collect();
        let mut total = Decimal::ZERO;
        for row in rows {
            total += *row.lock().await;
        }
        total
    }

    async fn row(&self, id: AccountId) -> Option<Row> {
        self.accounts.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        let row = self.row(id).await.ok_or(StoreError::AccountNotFound(id))?;
        let balance = *row.lock().await;
        Ok(Account::new(id, balance))
    }

    async fn create_account(
        &self,
        id: AccountId,
        initial_balance: Amount,
    ) -> Result<Account, StoreError> {
        if id == UNSET_ACCOUNT_ID {
            return Err(StoreError::AccountCreationFailed {
                account_id: id,
                reason: "account id must be positive".to_string(),
            });
        }
        if initial_balance < Decimal::ZERO {
            return Err(StoreError::AccountCreationFailed {
                account_id: id,
                reason: format!("balance must not be negative, got {initial_balance}"),
            });
        }

        let initial_balance =
            check_amount_range(initial_balance).map_err(|e| StoreError::AccountCreationFailed {
                account_id: id,
                reason: e.to_string(),
            })?;

        let mut accounts = self.accounts.write().await;
        match accounts.entry(id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateAccount(id)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(initial_balance)));
                info!(account_id = id, balance = %initial_balance, "Account created");
                Ok(Account::new(id, initial_balance))
            }
        }
    }

    async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Amount,
    ) -> Result<(), StoreError> {
        validate_transfer(source, destination, amount)?;

        let order = LockOrder::new(source, destination);
        let first_row = self
            .row(order.first)
            .await
            .ok_or(StoreError::AccountNotFound(order.first))?;
        let second_row = self
            .row(order.second)
            .await
            .ok_or(StoreError::AccountNotFound(order.second))?;

        let mut first = first_row.lock().await;
        let mut second = second_row.lock().await;

        let [(_, first_balance), (_, second_balance)] =
            settle(source, destination, amount, [*first, *second]).map_err(|e| {
                let err = StoreError::settlement(e, source, amount);
                debug!(source, destination, %amount, error = %err, "Transfer rejected");
                err
            })?;

        // Taken before any write: no await point between the balance
        // updates and the audit append.
        let mut transfers = self.transfers.lock().await;
        let before = (*first, *second);
        *first = first_balance;
        *second = second_balance;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            *first = before.0;
            *second = before.1;
            debug!(source, destination, %amount, "Transfer rolled back");
            return Err(StoreError::transaction(TxStage::Commit, "injected failure"));
        }

        let sequence = transfers.len() as i64 + 1;
        transfers.push(TransferRecord {
            sequence,
            source,
            destination,
            amount,
            recorded_at: Utc::now(),
        });

        info!(source, destination, %amount, sequence, "Transfer committed");
        Ok(())
    }

    async fn list_transfers(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<TransferRecord>, StoreError> {
        let transfers = self.transfers.lock().await;
        Ok(transfers
            .iter()
            .filter(|record| account.is_none_or(|id| record.involves(id)))
            .cloned()
            .collect())
    }
}
