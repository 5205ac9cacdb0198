//! Payment entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use surgiguide_core::error::CoreError;
use surgiguide_core::payment::{PaymentState, PaymentStatus, PaymentType};
use surgiguide_core::types::{DbId, Money, Timestamp};

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub case_id: DbId,
    pub quote_id: Option<DbId>,
    pub payment_type: String,
    pub amount: Money,
    pub status: String,
    pub proof_url: String,
    pub proof_reference: Option<String>,
    pub payer_notes: Option<String>,
    pub verified_by_id: Option<DbId>,
    pub verified_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub refund_requested_at: Option<Timestamp>,
    pub refund_reason: Option<String>,
    pub is_refunded: bool,
    pub refunded_amount: Option<Money>,
    pub refunded_at: Option<Timestamp>,
    pub refund_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    pub fn kind(&self) -> Result<PaymentType, CoreError> {
        self.payment_type.parse()
    }

    pub fn state(&self) -> Result<PaymentState, CoreError> {
        Ok(PaymentState {
            payment_type: self.kind()?,
            status: self.status.parse::<PaymentStatus>()?,
            amount: self.amount,
            is_refunded: self.is_refunded,
            refund_requested: self.refund_requested_at.is_some(),
        })
    }
}

/// A payment proof about to be recorded as pending.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub case_id: DbId,
    pub quote_id: Option<DbId>,
    pub payment_type: PaymentType,
    pub amount: Money,
    pub proof_url: String,
    pub proof_reference: Option<String>,
    pub payer_notes: Option<String>,
}
