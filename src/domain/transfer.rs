use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountId, Amount, ValidationError, check_amount_range, require_account_id};

/// Audit record for one committed transfer. Append-only: never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Insertion order, assigned by the store
    pub sequence: i64,
    /// Debited account
    pub source: AccountId,
    /// Credited account
    pub destination: AccountId,
    /// Always strictly positive
    pub amount: Amount,
    /// Commit time as seen by the store
    pub recorded_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.source == account_id || self.destination == account_id
    }
}

/// Reject transfers that are invalid regardless of ledger state.
pub fn validate_transfer(
    source: AccountId,
    destination: AccountId,
    amount: Amount,
) -> Result<(), ValidationError> {
    require_account_id(source)?;
    require_account_id(destination)?;
    if source == destination {
        return Err(ValidationError::SameAccount(source));
    }
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    check_amount_range(amount)?;
    Ok(())
}
