use super::{AccountId, Amount, amount_limit};

/// Deterministic lock-acquisition order for a pair of accounts.
///
/// Every code path that locks two accounts must acquire `first` before
/// `second`. Two transfers sharing an account then always contend in the
/// same order, so neither can hold one row while waiting for the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    pub first: AccountId,
    pub second: AccountId,
}

impl LockOrder {
    /// Ascending numeric order, independent of argument order.
    pub fn new(a: AccountId, b: AccountId) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn accounts(&self) -> [AccountId; 2] {
        [self.first, self.second]
    }
}

/// Signed balance changes for a transfer, in lock order.
/// The source receives `-amount`, the destination `+amount`.
pub fn transfer_deltas(
    source: AccountId,
    destination: AccountId,
    amount: Amount,
) -> [(AccountId, Amount); 2] {
    LockOrder::new(source, destination)
        .accounts()
        .map(|id| if id == source { (id, -amount) } else { (id, amount) })
}

/// Why a locked pair of balances cannot take a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The source balance is below the amount.
    InsufficientFunds { balance: Amount },
    /// Applying the delta would leave this account outside the representable range.
    BalanceOverflow(AccountId),
}

/// Balances after a transfer, computed from the balances of the locked pair.
///
/// `locked` is in lock order, and so is the result. Nothing is written: the
/// caller applies the result only when this returns `Ok`.
pub fn settle(
    source: AccountId,
    destination: AccountId,
    amount: Amount,
    locked: [Amount; 2],
) -> Result<[(AccountId, Amount); 2], SettlementError> {
    let deltas = transfer_deltas(source, destination, amount);
    let source_balance = if deltas[0].0 == source {
        locked[0]
    } else {
        locked[1]
    };
    if source_balance < amount {
        return Err(SettlementError::InsufficientFunds {
            balance: source_balance,
        });
    }

    let limit = amount_limit();
    let mut settled = deltas;
    for ((id, balance), current) in settled.iter_mut().zip(locked) {
        *balance = current
            .checked_add(*balance)
            .filter(|next| next.abs() < limit)
            .ok_or(SettlementError::BalanceOverflow(*id))?;
    }
    Ok(settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lock_order_is_direction_independent() {
        assert_eq!(LockOrder::new(1, 2), LockOrder::new(2, 1));
        assert_eq!(LockOrder::new(9, 3).accounts(), [3, 9]);
        assert_eq!(LockOrder::new(3, 9).accounts(), [3, 9]);
    }

    #[test]
    fn test_transfer_deltas_lower_source() {
        assert_eq!(
            transfer_deltas(1, 2, dec!(30.00)),
            [(1, dec!(-30.00)), (2, dec!(30.00))]
        );
    }

    #[test]
    fn test_transfer_deltas_higher_source() {
        assert_eq!(
            transfer_deltas(2, 1, dec!(30.00)),
            [(1, dec!(30.00)), (2, dec!(-30.00))]
        );
    }

    #[test]
    fn test_transfer_deltas_conserve_value() {
        let deltas = transfer_deltas(17, 4, dec!(12.34));
        let sum: Decimal = deltas.iter().map(|(_, delta)| *delta).sum();
        assert_eq!(sum, Decimal::ZERO);
    }

    #[test]
    fn test_settle_in_lock_order() {
        assert_eq!(
            settle(2, 1, dec!(30.00), [dec!(0.00), dec!(100.00)]),
            Ok([(1, dec!(30.00)), (2, dec!(70.00))])
        );
    }

    #[test]
    fn test_settle_exact_drain() {
        assert_eq!(
            settle(1, 2, dec!(100.00), [dec!(100.00), dec!(0)]),
            Ok([(1, dec!(0.00)), (2, dec!(100.00))])
        );
    }

    #[test]
    fn test_settle_insufficient_funds() {
        assert_eq!(
            settle(1, 2, dec!(100.01), [dec!(100.00), dec!(0)]),
            Err(SettlementError::InsufficientFunds {
                balance: dec!(100.00)
            })
        );
    }

    #[test]
    fn test_settle_rejects_credit_past_limit() {
        let near_limit = dec!(99999999999999999999.99999999);
        assert_eq!(
            settle(2, 1, dec!(0.00000001), [near_limit, dec!(1)]),
            Err(SettlementError::BalanceOverflow(1))
        );
    }

    #[test]
    fn test_settle_never_panics_near_decimal_max() {
        assert_eq!(
            settle(2, 1, dec!(1), [Decimal::MAX, dec!(1)]),
            Err(SettlementError::BalanceOverflow(1))
        );
    }
}
