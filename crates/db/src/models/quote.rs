//! Case quote entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surgiguide_core::quote::{FeeBreakdown, QuoteState, QuoteTotals};
use surgiguide_core::types::{DbId, Money, Timestamp};

/// A row from the `case_quotes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CaseQuote {
    pub id: DbId,
    pub case_id: DbId,
    pub study_fee: Money,
    pub design_fee: Money,
    pub production_fee: Money,
    pub delivery_fee: Money,
    pub subtotal: Money,
    pub discount_code_id: Option<DbId>,
    pub discount_amount: Money,
    pub vat_rate: Decimal,
    pub vat_amount: Money,
    pub total_amount: Money,
    pub is_sent: bool,
    pub sent_at: Option<Timestamp>,
    pub is_accepted: bool,
    pub accepted_at: Option<Timestamp>,
    pub is_rejected: bool,
    pub rejected_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub revision_requested: bool,
    pub revision: i32,
    pub valid_until: Option<Timestamp>,
    pub created_by_designer_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CaseQuote {
    pub fn fees(&self) -> FeeBreakdown {
        FeeBreakdown {
            study_fee: self.study_fee,
            design_fee: self.design_fee,
            production_fee: self.production_fee,
            delivery_fee: self.delivery_fee,
        }
    }

    pub fn state(&self) -> QuoteState {
        QuoteState {
            is_sent: self.is_sent,
            is_accepted: self.is_accepted,
            is_rejected: self.is_rejected,
            revision_requested: self.revision_requested,
            has_discount: self.discount_code_id.is_some(),
            valid_until: self.valid_until,
        }
    }

    /// Order amount before any discount, as seen by discount codes.
    pub fn order_amount(&self) -> Money {
        self.fees().sum()
    }
}

/// Fee input shared by quote creation and revision.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuoteFees {
    pub study_fee: Money,
    pub design_fee: Money,
    pub production_fee: Money,
    pub delivery_fee: Money,
}

impl From<QuoteFees> for FeeBreakdown {
    fn from(f: QuoteFees) -> Self {
        FeeBreakdown {
            study_fee: f.study_fee,
            design_fee: f.design_fee,
            production_fee: f.production_fee,
            delivery_fee: f.delivery_fee,
        }
    }
}

/// A fully priced quote ready to be inserted as sent.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub case_id: DbId,
    pub fees: FeeBreakdown,
    pub totals: QuoteTotals,
    pub vat_rate: Decimal,
    pub valid_until: Option<Timestamp>,
    pub created_by_designer_id: Option<DbId>,
}

/// New pricing for an existing quote.
#[derive(Debug, Clone)]
pub struct QuotePricing {
    pub fees: FeeBreakdown,
    pub totals: QuoteTotals,
    pub vat_rate: Decimal,
    pub discount_code_id: Option<DbId>,
}
