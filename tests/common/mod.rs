// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use payments::application::AccountService;
use payments::domain::{AccountId, Amount};
use payments::storage::{InMemoryStore, LedgerStore};

/// Helper to create a service over a fresh in-memory ledger.
/// The store is returned too so tests can inspect it directly.
pub fn test_service() -> (AccountService, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let service = AccountService::new(store.clone());
    (service, store)
}

/// Helper to create a service with accounts already opened.
pub async fn seeded_service(
    accounts: &[(AccountId, &str)],
) -> Result<(AccountService, Arc<InMemoryStore>)> {
    let (service, store) = test_service();
    for (id, balance) in accounts {
        service.create_account(*id, balance).await?;
    }
    Ok((service, store))
}

/// Committed balance of one account, panicking if it does not exist.
pub async fn balance_of(store: &dyn LedgerStore, id: AccountId) -> Amount {
    store
        .get_account(id)
        .await
        .unwrap_or_else(|e| panic!("account {id} should exist: {e}"))
        .balance
}
