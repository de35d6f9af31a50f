use rust_decimal::Decimal;

use super::ValidationError;

/// Money is an exact decimal; scale is preserved through arithmetic so
/// "100.00" - "30.00" renders as "70.00".
pub type Amount = Decimal;

/// Most decimal places an amount or balance may carry.
pub const MAX_SCALE: u32 = 8;

/// Most integer digits an amount or balance may carry.
pub const MAX_INTEGER_DIGITS: u32 = 20;

/// Exclusive magnitude bound for amounts and balances (10^20).
///
/// The PostgreSQL schema enforces the same bound, so every stored balance
/// decodes into an [`Amount`] and the sum of two in-range values never
/// overflows `Decimal`.
pub fn amount_limit() -> Amount {
    Decimal::from_i128_with_scale(10_i128.pow(MAX_INTEGER_DIGITS + MAX_SCALE), MAX_SCALE)
}

/// Reject values the ledger cannot hold. The scale is checked as written,
/// so "1.000000000" is out of range too.
pub fn check_amount_range(amount: Amount) -> Result<Amount, ValidationError> {
    if amount.scale() > MAX_SCALE || amount.abs() >= amount_limit() {
        return Err(ValidationError::AmountOutOfRange(amount.to_string()));
    }
    Ok(amount)
}

/// Parse a decimal string into an exact amount.
/// Example: "50.00" -> 50.00, " 12.5 " -> 12.5
///
/// Inputs that cannot be represented without rounding are rejected.
pub fn parse_amount(input: &str) -> Result<Amount, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingAmount);
    }
    let amount = Decimal::from_str_exact(input)
        .map_err(|_| ValidationError::MalformedAmount(input.to_string()))?;
    check_amount_range(amount)
}

/// Parse a strictly positive amount (transfer amounts).
pub fn parse_positive_amount(input: &str) -> Result<Amount, ValidationError> {
    let amount = parse_amount(input)?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

/// Parse a non-negative amount (opening balances).
pub fn parse_balance(input: &str) -> Result<Amount, ValidationError> {
    let balance = parse_amount(input)?;
    if balance < Decimal::ZERO {
        return Err(ValidationError::NegativeBalance(balance));
    }
    Ok(balance)
}
