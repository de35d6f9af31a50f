use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountId, TransferRecord};

/// Missing fields decode to their zero value and are rejected by validation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAccountRequest {
    pub account_id: AccountId,
    pub initial_balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: AccountId,
    pub balance: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            balance: account.balance.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferRequest {
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransferQuery {
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecordResponse {
    pub sequence: i64,
    pub source_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<TransferRecord> for TransferRecordResponse {
    fn from(record: TransferRecord) -> Self {
        Self {
            sequence: record.sequence,
            source_account_id: record.source,
            destination_account_id: record.destination,
            amount: record.amount.to_string(),
            recorded_at: record.recorded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
