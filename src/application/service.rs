use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    Account, AccountId, TransferRecord, ValidationError, parse_balance, parse_positive_amount,
    require_account_id,
};
use crate::storage::{LedgerStore, StoreError};

use super::AppError;

/// Application service providing the account and transfer operations.
/// This is the primary interface for any client (HTTP, CLI, tests).
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    /// Create a new service over the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account with an initial balance given as a decimal string.
    ///
    /// The existence check is advisory. Two concurrent creations of the same
    /// id can both pass it; the store's uniqueness guard then rejects the
    /// loser, which is reported as `AccountAlreadyExists` all the same.
    pub async fn create_account(
        &self,
        account_id: AccountId,
        initial_balance: &str,
    ) -> Result<Account, AppError> {
        let account_id = require_account_id(account_id)?;
        let balance = parse_balance(initial_balance)?;

        match self.store.get_account(account_id).await {
            Ok(_) => {
                debug!(account_id, "Account already exists");
                return Err(AppError::AccountAlreadyExists(account_id));
            }
            Err(StoreError::AccountNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let account = self.store.create_account(account_id, balance).await?;
        info!(account_id, balance = %account.balance, "Account opened");
        Ok(account)
    }

    /// Get an account by id.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, AppError> {
        let account_id = require_account_id(account_id)?;
        Ok(self.store.get_account(account_id).await?)
    }

    // ========================
    // Transfer operations
    // ========================

    /// Move funds between two accounts. The amount is a decimal string.
    pub async fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: &str,
    ) -> Result<(), AppError> {
        require_account_id(source)?;
        require_account_id(destination)?;
        if source == destination {
            return Err(ValidationError::SameAccount(source).into());
        }
        let amount = parse_positive_amount(amount)?;

        match self.store.transfer(source, destination, amount).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_retryable() {
                    warn!(source, destination, %amount, error = %e, "Transfer failed, retryable");
                } else {
                    debug!(source, destination, %amount, error = %e, "Transfer rejected");
                }
                Err(e.into())
            }
        }
    }

    /// Audit log, optionally restricted to transfers touching one account.
    pub async fn list_transfers(
        &self,
        account_id: Option<AccountId>,
    ) -> Result<Vec<TransferRecord>, AppError> {
        if let Some(id) = account_id {
            require_account_id(id)?;
        }
        Ok(self.store.list_transfers(account_id).await?)
    }
}
