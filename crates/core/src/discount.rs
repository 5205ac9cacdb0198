//! Discount code rules: code format, eligibility checks and discount pricing.
//!
//! Eligibility is checked in a fixed order and the first failure wins:
//! exists, active, inside the validity window, minimum order amount, total
//! usage cap, per-client usage cap.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quote::round2;
use crate::types::{validate_money, Money, Timestamp};

/// Minimum length of a discount code.
pub const MIN_CODE_LENGTH: usize = 3;

/// Maximum length of a discount code.
pub const MAX_CODE_LENGTH: usize = 20;

pub const DISCOUNT_TYPE_PERCENTAGE: &str = "percentage";
pub const DISCOUNT_TYPE_FIXED: &str = "fixed";

/// How `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` percent of the order, optionally capped.
    Percentage,
    /// `discount_value` off the order.
    Fixed,
}

impl DiscountType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountType::Percentage => DISCOUNT_TYPE_PERCENTAGE,
            DiscountType::Fixed => DISCOUNT_TYPE_FIXED,
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            DISCOUNT_TYPE_PERCENTAGE => Ok(DiscountType::Percentage),
            DISCOUNT_TYPE_FIXED => Ok(DiscountType::Fixed),
            other => Err(CoreError::Validation(format!(
                "Invalid discount type '{other}'. Must be one of: {DISCOUNT_TYPE_PERCENTAGE}, {DISCOUNT_TYPE_FIXED}"
            ))),
        }
    }
}

/// Normalize a user-supplied code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validate the shape of a code: 3 to 20 ASCII letters or digits.
pub fn validate_code_format(code: &str) -> Result<(), CoreError> {
    let len = code.len();
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Discount code must be between {MIN_CODE_LENGTH} and {MAX_CODE_LENGTH} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(
            "Discount code may contain only letters and digits".to_string(),
        ));
    }
    Ok(())
}

/// Validate the numeric definition of a code before it is stored.
pub fn validate_definition(rules: &DiscountRules) -> Result<(), CoreError> {
    validate_money("discount_value", rules.discount_value)?;
    if let Some(max) = rules.max_discount_amount {
        validate_money("max_discount_amount", max)?;
    }
    if let Some(min) = rules.min_order_amount {
        validate_money("min_order_amount", min)?;
    }
    if rules.discount_value <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "discount_value must be greater than zero".to_string(),
        ));
    }
    if rules.discount_type == DiscountType::Percentage && rules.discount_value > Decimal::ONE_HUNDRED
    {
        return Err(CoreError::Validation(
            "A percentage discount cannot exceed 100".to_string(),
        ));
    }
    if rules.max_discount_amount.is_some_and(|m| m <= Decimal::ZERO) {
        return Err(CoreError::Validation(
            "max_discount_amount must be greater than zero".to_string(),
        ));
    }
    if rules.min_order_amount.is_some_and(|m| m.is_sign_negative()) {
        return Err(CoreError::Validation(
            "min_order_amount must not be negative".to_string(),
        ));
    }
    if rules.max_uses_total.is_some_and(|m| m < 1) || rules.max_uses_per_client.is_some_and(|m| m < 1)
    {
        return Err(CoreError::Validation(
            "Usage limits must be at least 1".to_string(),
        ));
    }
    if let (Some(from), Some(until)) = (rules.valid_from, rules.valid_until) {
        if from >= until {
            return Err(CoreError::Validation(
                "valid_from must be before valid_until".to_string(),
            ));
        }
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Eligibility
-------------------------------------------------------------------------- */

/// Why a code cannot be used for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRejection {
    NotFound,
    Inactive,
    NotYetValid,
    Expired,
    BelowMinimumOrder,
    UsageLimitReached,
    ClientUsageLimitReached,
}

impl DiscountRejection {
    pub fn message(self) -> &'static str {
        match self {
            DiscountRejection::NotFound => "Discount code not found",
            DiscountRejection::Inactive => "Discount code is not active",
            DiscountRejection::NotYetValid => "Discount code is not valid yet",
            DiscountRejection::Expired => "Discount code has expired",
            DiscountRejection::BelowMinimumOrder => {
                "Order amount is below the minimum for this discount code"
            }
            DiscountRejection::UsageLimitReached => "Discount code usage limit reached",
            DiscountRejection::ClientUsageLimitReached => {
                "You have already used this discount code the maximum number of times"
            }
        }
    }
}

impl DiscountRejection {
    /// Convert into the error taxonomy, naming the code that was looked up.
    pub fn into_error(self, code: &str) -> CoreError {
        let msg = self.message().to_string();
        match self {
            DiscountRejection::NotFound => CoreError::NotFoundByKey {
                entity: "DiscountCode",
                key: code.to_string(),
            },
            DiscountRejection::Inactive
            | DiscountRejection::UsageLimitReached
            | DiscountRejection::ClientUsageLimitReached => CoreError::InvalidState(msg),
            DiscountRejection::NotYetValid | DiscountRejection::Expired => CoreError::Expired(msg),
            DiscountRejection::BelowMinimumOrder => CoreError::Validation(msg),
        }
    }
}

/// The fields of a stored code that eligibility depends on.
#[derive(Debug, Clone, Copy)]
pub struct DiscountRules {
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub min_order_amount: Option<Decimal>,
    pub max_uses_total: Option<i32>,
    pub max_uses_per_client: Option<i32>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    pub is_active: bool,
    pub times_used: i32,
}

/// Check whether a code may be used, stopping at the first failing rule.
///
/// `client_uses` is the number of recorded usages of this code by the
/// client. The existence check is the caller's (a missing row is
/// [`DiscountRejection::NotFound`]).
pub fn check_eligibility(
    rules: &DiscountRules,
    now: Timestamp,
    order_amount: Money,
    client_uses: i64,
) -> Result<(), DiscountRejection> {
    if !rules.is_active {
        return Err(DiscountRejection::Inactive);
    }
    if rules.valid_from.is_some_and(|from| now < from) {
        return Err(DiscountRejection::NotYetValid);
    }
    if rules.valid_until.is_some_and(|until| now > until) {
        return Err(DiscountRejection::Expired);
    }
    if rules.min_order_amount.is_some_and(|min| order_amount < min) {
        return Err(DiscountRejection::BelowMinimumOrder);
    }
    if let Some(max) = rules.max_uses_total {
        if rules.times_used >= max {
            return Err(DiscountRejection::UsageLimitReached);
        }
    }
    if let Some(max) = rules.max_uses_per_client {
        if client_uses >= i64::from(max) {
            return Err(DiscountRejection::ClientUsageLimitReached);
        }
    }
    Ok(())
}

/// Price a code against an order amount.
///
/// The result never exceeds the order amount, respects the percentage cap,
/// and is rounded to 2 decimal places.
pub fn calculate_discount(rules: &DiscountRules, order_amount: Money) -> Money {
    if order_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = match rules.discount_type {
        DiscountType::Percentage => {
            let pct = order_amount * rules.discount_value / Decimal::ONE_HUNDRED;
            match rules.max_discount_amount {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
        DiscountType::Fixed => rules.discount_value,
    };
    round2(raw.min(order_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn rules() -> DiscountRules {
        DiscountRules {
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            max_discount_amount: None,
            min_order_amount: None,
            max_uses_total: None,
            max_uses_per_client: None,
            valid_from: None,
            valid_until: None,
            is_active: true,
            times_used: 0,
        }
    }

    #[test]
    fn code_format_bounds() {
        assert!(validate_code_format("AB").is_err());
        assert!(validate_code_format("ABC").is_ok());
        assert!(validate_code_format("A".repeat(20).as_str()).is_ok());
        assert!(validate_code_format("A".repeat(21).as_str()).is_err());
        assert!(validate_code_format("SAVE-10").is_err());
    }

    #[test]
    fn codes_normalize_to_upper_case() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
    }

    #[test]
    fn percentage_discount_is_capped() {
        let r = DiscountRules {
            discount_value: dec!(50),
            max_discount_amount: Some(dec!(100)),
            ..rules()
        };
        assert_eq!(calculate_discount(&r, dec!(1000)), dec!(100));
        assert_eq!(calculate_discount(&r, dec!(150)), dec!(75));
    }

    #[test]
    fn fixed_discount_never_exceeds_order() {
        let r = DiscountRules {
            discount_type: DiscountType::Fixed,
            discount_value: dec!(500),
            ..rules()
        };
        assert_eq!(calculate_discount(&r, dec!(320)), dec!(320));
        assert_eq!(calculate_discount(&r, dec!(800)), dec!(500));
    }

    #[test]
    fn percentage_discount_is_rounded() {
        let r = DiscountRules {
            discount_value: dec!(12.5),
            ..rules()
        };
        // 12.5% of 99.99 = 12.49875
        assert_eq!(calculate_discount(&r, dec!(99.99)), dec!(12.50));
    }

    #[test]
    fn eligibility_checks_run_in_order() {
        let now = Utc::now();
        // Inactive and expired: inactive wins.
        let r = DiscountRules {
            is_active: false,
            valid_until: Some(now - Duration::days(1)),
            ..rules()
        };
        assert_eq!(
            check_eligibility(&r, now, dec!(100), 0),
            Err(DiscountRejection::Inactive)
        );

        // Expired and below minimum: expired wins.
        let r = DiscountRules {
            valid_until: Some(now - Duration::days(1)),
            min_order_amount: Some(dec!(500)),
            ..rules()
        };
        assert_eq!(
            check_eligibility(&r, now, dec!(100), 0),
            Err(DiscountRejection::Expired)
        );

        // Below minimum and exhausted: minimum wins.
        let r = DiscountRules {
            min_order_amount: Some(dec!(500)),
            max_uses_total: Some(1),
            times_used: 1,
            ..rules()
        };
        assert_eq!(
            check_eligibility(&r, now, dec!(100), 0),
            Err(DiscountRejection::BelowMinimumOrder)
        );

        // Exhausted globally and per client: global wins.
        let r = DiscountRules {
            max_uses_total: Some(1),
            times_used: 1,
            max_uses_per_client: Some(1),
            ..rules()
        };
        assert_eq!(
            check_eligibility(&r, now, dec!(100), 1),
            Err(DiscountRejection::UsageLimitReached)
        );
    }

    #[test]
    fn future_code_is_not_yet_valid() {
        let now = Utc::now();
        let r = DiscountRules {
            valid_from: Some(now + Duration::hours(1)),
            ..rules()
        };
        assert_eq!(
            check_eligibility(&r, now, dec!(100), 0),
            Err(DiscountRejection::NotYetValid)
        );
    }

    #[test]
    fn per_client_limit_applies() {
        let r = DiscountRules {
            max_uses_per_client: Some(2),
            ..rules()
        };
        assert!(check_eligibility(&r, Utc::now(), dec!(100), 1).is_ok());
        assert_eq!(
            check_eligibility(&r, Utc::now(), dec!(100), 2),
            Err(DiscountRejection::ClientUsageLimitReached)
        );
    }

    #[test]
    fn order_exactly_at_minimum_is_eligible() {
        let r = DiscountRules {
            min_order_amount: Some(dec!(100)),
            ..rules()
        };
        assert!(check_eligibility(&r, Utc::now(), dec!(100), 0).is_ok());
    }

    #[test]
    fn definition_limits() {
        let over = DiscountRules {
            discount_value: dec!(101),
            ..rules()
        };
        assert!(validate_definition(&over).is_err());

        let zero_fixed = DiscountRules {
            discount_type: DiscountType::Fixed,
            discount_value: dec!(0),
            ..rules()
        };
        assert!(validate_definition(&zero_fixed).is_err());

        let now = Utc::now();
        let inverted = DiscountRules {
            valid_from: Some(now),
            valid_until: Some(now - Duration::days(1)),
            ..rules()
        };
        assert!(validate_definition(&inverted).is_err());

        let ok = DiscountRules {
            discount_type: DiscountType::Fixed,
            discount_value: dec!(250),
            min_order_amount: Some(dec!(500)),
            max_uses_total: Some(10),
            max_uses_per_client: Some(1),
            ..rules()
        };
        assert!(validate_definition(&ok).is_ok());
    }

    #[test]
    fn definition_amounts_must_fit_the_money_columns() {
        let sub_cent = DiscountRules {
            discount_value: dec!(12.345),
            ..rules()
        };
        assert_matches!(validate_definition(&sub_cent), Err(CoreError::Validation(_)));

        let huge_cap = DiscountRules {
            max_discount_amount: Some(dec!(70000000000000000000000000000)),
            ..rules()
        };
        assert_matches!(validate_definition(&huge_cap), Err(CoreError::Validation(_)));

        let sub_cent_minimum = DiscountRules {
            min_order_amount: Some(dec!(99.999)),
            ..rules()
        };
        assert_matches!(
            validate_definition(&sub_cent_minimum),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejections_map_onto_error_taxonomy() {
        assert_matches!(
            DiscountRejection::NotFound.into_error("NOPE"),
            CoreError::NotFoundByKey { key, .. } if key == "NOPE"
        );
        assert_matches!(
            DiscountRejection::Inactive.into_error("X"),
            CoreError::InvalidState(_)
        );
        assert_matches!(
            DiscountRejection::Expired.into_error("X"),
            CoreError::Expired(_)
        );
        assert_matches!(
            DiscountRejection::BelowMinimumOrder.into_error("X"),
            CoreError::Validation(_)
        );
    }
}
