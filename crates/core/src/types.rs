use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Currency amounts are fixed-point decimals stored as `NUMERIC(12,2)`.
pub type Money = rust_decimal::Decimal;

/// Decimal places a stored amount may carry.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(12,2)` column holds: 9,999,999,999.99.
pub const MAX_MONEY: Money = Money::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Reject an amount the money columns cannot store exactly.
///
/// Trailing zeros do not count towards the scale, so `10.500` is accepted.
pub fn validate_money(field: &str, value: Money) -> Result<(), CoreError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(CoreError::Validation(format!(
            "{field} must have at most {MONEY_SCALE} decimal places"
        )));
    }
    if value.abs() > MAX_MONEY {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_MONEY}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn max_money_matches_column_limit() {
        assert_eq!(MAX_MONEY, dec!(9999999999.99));
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert_matches!(
            validate_money("amount", dec!(0.005)),
            Err(CoreError::Validation(msg)) if msg.contains("decimal places")
        );
        assert!(validate_money("amount", dec!(10.500)).is_ok());
        assert!(validate_money("amount", dec!(0.01)).is_ok());
    }

    #[test]
    fn amounts_beyond_the_column_are_rejected() {
        assert!(validate_money("amount", MAX_MONEY).is_ok());
        assert!(validate_money("amount", dec!(10000000000.00)).is_err());
        assert!(validate_money("amount", dec!(70000000000000000000000000000)).is_err());
    }
}
