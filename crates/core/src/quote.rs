//! Quote fee math and quote lifecycle checks.
//!
//! Totals follow
//! `total = round2((study + design + production + delivery - discount) * (1 + vat_rate / 100))`.
//! Rounding happens once on each stored computed field; the discount amount
//! is rounded before it is subtracted.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{validate_money, Money, Timestamp, MAX_MONEY};

/// Maximum VAT rate accepted on a quote, in percent.
pub const MAX_VAT_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Maximum length of a quote rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 2_000;

/// Round a currency amount to 2 decimal places, midpoint away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The four fee lines of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub study_fee: Money,
    pub design_fee: Money,
    pub production_fee: Money,
    pub delivery_fee: Money,
}

impl FeeBreakdown {
    /// Sum of the four fees. Call [`FeeBreakdown::validate`] first; the
    /// result is then bounded by four times [`MAX_MONEY`].
    pub fn sum(&self) -> Money {
        self.checked_sum().unwrap_or(Decimal::MAX)
    }

    fn checked_sum(&self) -> Option<Money> {
        self.study_fee
            .checked_add(self.design_fee)?
            .checked_add(self.production_fee)?
            .checked_add(self.delivery_fee)
    }

    /// The part of the order a discount code may reduce. The study fee is
    /// never discountable.
    pub fn discountable_base(&self) -> Money {
        self.design_fee
            .saturating_add(self.production_fee)
            .saturating_add(self.delivery_fee)
    }

    /// Every fee must be a storable, non-negative amount and the quote must
    /// charge something.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("study_fee", self.study_fee),
            ("design_fee", self.design_fee),
            ("production_fee", self.production_fee),
            ("delivery_fee", self.delivery_fee),
        ] {
            validate_money(name, value)?;
            if value.is_sign_negative() {
                return Err(CoreError::Validation(format!(
                    "{name} must not be negative"
                )));
            }
        }
        if self.sum().is_zero() {
            return Err(CoreError::Validation(
                "A quote must contain at least one non-zero fee".to_string(),
            ));
        }
        Ok(())
    }
}

/// Computed financial fields of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuoteTotals {
    /// Sum of fees minus the discount.
    pub subtotal: Money,
    pub discount_amount: Money,
    pub vat_amount: Money,
    pub total_amount: Money,
}

/// Validate a VAT rate given in percent.
pub fn validate_vat_rate(vat_rate: Decimal) -> Result<(), CoreError> {
    if vat_rate.is_sign_negative() || vat_rate > MAX_VAT_RATE {
        return Err(CoreError::Validation(format!(
            "vat_rate must be between 0 and {MAX_VAT_RATE}"
        )));
    }
    if vat_rate.normalize().scale() > 2 {
        return Err(CoreError::Validation(
            "vat_rate must have at most 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

/// Compute subtotal, VAT and total for a fee breakdown.
pub fn compute_totals(
    fees: &FeeBreakdown,
    discount_amount: Money,
    vat_rate: Decimal,
) -> Result<QuoteTotals, CoreError> {
    fees.validate()?;
    validate_vat_rate(vat_rate)?;

    let discount_amount = round2(discount_amount);
    if discount_amount.is_sign_negative() {
        return Err(CoreError::Validation(
            "discount_amount must not be negative".to_string(),
        ));
    }
    if discount_amount > fees.discountable_base() {
        return Err(CoreError::Validation(
            "discount_amount exceeds the discountable fees".to_string(),
        ));
    }

    let overflow = || CoreError::Validation(format!("Quote total must not exceed {MAX_MONEY}"));
    let subtotal = fees
        .checked_sum()
        .and_then(|sum| sum.checked_sub(discount_amount))
        .ok_or_else(overflow)?;
    let vat = subtotal
        .checked_mul(vat_rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    let total_amount = subtotal.checked_add(vat).map(round2).ok_or_else(overflow)?;
    if total_amount > MAX_MONEY {
        return Err(overflow());
    }

    Ok(QuoteTotals {
        subtotal: round2(subtotal),
        discount_amount,
        vat_amount: round2(vat),
        total_amount,
    })
}

/* --------------------------------------------------------------------------
Lifecycle checks
-------------------------------------------------------------------------- */

/// The flags of a stored quote that gate what can happen to it next.
#[derive(Debug, Clone, Copy)]
pub struct QuoteState {
    pub is_sent: bool,
    pub is_accepted: bool,
    pub is_rejected: bool,
    pub revision_requested: bool,
    pub has_discount: bool,
    pub valid_until: Option<Timestamp>,
}

impl QuoteState {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }
}

/// A quote can be answered by the client only once, while it is sent.
pub fn ensure_respondable(state: &QuoteState) -> Result<(), CoreError> {
    if state.is_accepted {
        return Err(CoreError::InvalidState(
            "Quote has already been accepted".to_string(),
        ));
    }
    if state.is_rejected {
        return Err(CoreError::InvalidState(
            "Quote has already been rejected".to_string(),
        ));
    }
    if !state.is_sent {
        return Err(CoreError::InvalidState(
            "Quote has not been sent".to_string(),
        ));
    }
    Ok(())
}

/// Only a rejected quote whose client asked for a revision can be revised.
pub fn ensure_revisable(state: &QuoteState) -> Result<(), CoreError> {
    if !state.is_rejected {
        return Err(CoreError::InvalidState(
            "Only a rejected quote can be revised".to_string(),
        ));
    }
    if !state.revision_requested {
        return Err(CoreError::InvalidState(
            "The client did not request a revision of this quote".to_string(),
        ));
    }
    Ok(())
}

/// A discount code can be attached to an open quote that has none yet.
pub fn ensure_discount_applicable(state: &QuoteState) -> Result<(), CoreError> {
    if state.has_discount {
        return Err(CoreError::InvalidState(
            "Quote already has a discount code applied".to_string(),
        ));
    }
    ensure_discount_editable(state)
}

/// Discounts are frozen once the client has answered the quote.
pub fn ensure_discount_editable(state: &QuoteState) -> Result<(), CoreError> {
    if state.is_accepted {
        return Err(CoreError::InvalidState(
            "Quote has already been accepted".to_string(),
        ));
    }
    if state.is_rejected {
        return Err(CoreError::InvalidState(
            "Quote has been rejected".to_string(),
        ));
    }
    Ok(())
}

/// A rejection must say why.
pub fn validate_rejection_reason(reason: &str) -> Result<(), CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }
    if reason.len() > MAX_REJECTION_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Rejection reason exceeds maximum length of {MAX_REJECTION_REASON_LENGTH} characters"
        )));
    }
    Ok(())
}
