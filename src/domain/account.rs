use serde::{Deserialize, Serialize};

use super::{Amount, ValidationError};

/// Externally assigned account identifier.
pub type AccountId = u32;

/// Sentinel meaning "no account given". Never a valid primary key.
pub const UNSET_ACCOUNT_ID: AccountId = 0;

/// Reject the unset sentinel.
pub fn require_account_id(id: AccountId) -> Result<AccountId, ValidationError> {
    if id == UNSET_ACCOUNT_ID {
        return Err(ValidationError::UnsetAccountId);
    }
    Ok(id)
}

/// Parse an account id from its textual form (e.g. a URL path segment).
pub fn parse_account_id(input: &str) -> Result<AccountId, ValidationError> {
    let input = input.trim();
    let id: AccountId = input
        .parse()
        .map_err(|_| ValidationError::InvalidAccountId(input.to_string()))?;
    require_account_id(id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Committed balance, never negative.
    pub balance: Amount,
}

impl Account {
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Self { id, balance }
    }

    pub fn can_cover(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}
