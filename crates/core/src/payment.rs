//! Payment ledger rules: payment kinds, statuses, upload / verification /
//! refund preconditions and the case status each step leads to.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::case_status::CaseStatus;
use crate::error::CoreError;
use crate::types::{validate_money, Money};

/// The study fee is a fixed, non-refundable amount.
pub const STUDY_FEE_AMOUNT: Money = Decimal::ONE_HUNDRED;

/// Maximum length of a rejection or refund reason.
pub const MAX_REASON_LENGTH: usize = 2_000;

/// Maximum length of a proof URL / storage path.
pub const MAX_PROOF_URL_LENGTH: usize = 2_048;

/// What a payment pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    StudyFee,
    ProductionFee,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::StudyFee => "study_fee",
            PaymentType::ProductionFee => "production_fee",
        }
    }

    /// Status the case must be in for the client to upload this payment.
    pub fn required_case_status(self) -> CaseStatus {
        match self {
            PaymentType::StudyFee => CaseStatus::Draft,
            PaymentType::ProductionFee => CaseStatus::QuoteAccepted,
        }
    }

    /// Status the case moves to once a proof is uploaded.
    pub fn uploaded_case_status(self) -> CaseStatus {
        match self {
            PaymentType::StudyFee => CaseStatus::PendingStudyPayment,
            PaymentType::ProductionFee => CaseStatus::PendingProductionPayment,
        }
    }

    /// Status the case moves to once an admin verifies the payment.
    pub fn verified_case_status(self) -> CaseStatus {
        match self {
            PaymentType::StudyFee => CaseStatus::Submitted,
            PaymentType::ProductionFee => CaseStatus::InProduction,
        }
    }

    /// Status the case moves to when an admin rejects the payment.
    pub fn rejected_case_status(self) -> CaseStatus {
        match self {
            PaymentType::StudyFee => CaseStatus::Submitted,
            PaymentType::ProductionFee => CaseStatus::QuoteAccepted,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study_fee" => Ok(PaymentType::StudyFee),
            "production_fee" => Ok(PaymentType::ProductionFee),
            other => Err(CoreError::Validation(format!(
                "Unknown payment type '{other}'"
            ))),
        }
    }
}

/// Payment review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "verified" => Ok(PaymentStatus::Verified),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::Validation(format!(
                "Unknown payment status '{other}'"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
Upload
-------------------------------------------------------------------------- */

/// Check that a client may upload a payment of `payment_type` right now.
///
/// `has_open_payment` is whether the case already has a non-failed payment
/// of the same type.
pub fn ensure_uploadable(
    payment_type: PaymentType,
    case_status: CaseStatus,
    has_open_payment: bool,
) -> Result<(), CoreError> {
    let required = payment_type.required_case_status();
    if case_status != required {
        return Err(CoreError::InvalidState(format!(
            "A {payment_type} payment can only be uploaded while the case is '{required}' (current: '{case_status}')"
        )));
    }
    if has_open_payment {
        return Err(CoreError::Conflict(format!(
            "A {payment_type} payment already exists for this case"
        )));
    }
    Ok(())
}

/// Validate the uploaded amount against what is owed.
pub fn validate_upload_amount(amount: Money, expected: Money) -> Result<(), CoreError> {
    validate_money("amount", amount)?;
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    if amount != expected {
        return Err(CoreError::Validation(format!(
            "amount must equal {expected}"
        )));
    }
    Ok(())
}

/// Validate the proof reference supplied with an upload.
pub fn validate_proof_url(proof_url: &str) -> Result<(), CoreError> {
    let proof_url = proof_url.trim();
    if proof_url.is_empty() {
        return Err(CoreError::Validation(
            "proof_url is required".to_string(),
        ));
    }
    if proof_url.len() > MAX_PROOF_URL_LENGTH {
        return Err(CoreError::Validation(format!(
            "proof_url exceeds maximum length of {MAX_PROOF_URL_LENGTH} characters"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Review and refund
-------------------------------------------------------------------------- */

/// The fields of a stored payment that gate review and refunds.
#[derive(Debug, Clone, Copy)]
pub struct PaymentState {
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub amount: Money,
    pub is_refunded: bool,
    pub refund_requested: bool,
}

/// Verification and rejection apply to pending payments only.
pub fn ensure_pending(state: &PaymentState) -> Result<(), CoreError> {
    if state.status != PaymentStatus::Pending {
        return Err(CoreError::InvalidState(format!(
            "Payment is '{}', only pending payments can be reviewed",
            state.status
        )));
    }
    Ok(())
}

/// A client may ask for a refund of a verified production payment once.
pub fn ensure_refund_requestable(state: &PaymentState) -> Result<(), CoreError> {
    if state.payment_type == PaymentType::StudyFee {
        return Err(CoreError::InvalidState(
            "The study fee is non-refundable".to_string(),
        ));
    }
    if state.status != PaymentStatus::Verified || state.is_refunded {
        return Err(CoreError::InvalidState(
            "Only verified, non-refunded payments can be refunded".to_string(),
        ));
    }
    if state.refund_requested {
        return Err(CoreError::InvalidState(
            "A refund has already been requested for this payment".to_string(),
        ));
    }
    Ok(())
}

/// Approving or rejecting a refund needs an open request.
pub fn ensure_open_refund_request(state: &PaymentState) -> Result<(), CoreError> {
    if !state.refund_requested || state.is_refunded {
        return Err(CoreError::InvalidState(
            "Payment has no open refund request".to_string(),
        ));
    }
    Ok(())
}

/// `0 < refund_amount <= paid amount`.
pub fn validate_refund_amount(refund_amount: Money, paid: Money) -> Result<(), CoreError> {
    validate_money("refund amount", refund_amount)?;
    if refund_amount <= Decimal::ZERO || refund_amount > paid {
        return Err(CoreError::Validation(format!(
            "refund amount must be greater than 0 and at most {paid}"
        )));
    }
    Ok(())
}

/// Where the case goes when a refund request is turned down.
///
/// Only a case still parked in `refund_requested` moves back to production;
/// anything else stays where it is.
pub fn refund_rejected_case_status(current: CaseStatus) -> Option<CaseStatus> {
    (current == CaseStatus::RefundRequested).then_some(CaseStatus::InProduction)
}

/// Required free-text reason for rejections and refund requests.
pub fn validate_reason(field: &str, reason: &str) -> Result<(), CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if reason.len() > MAX_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {MAX_REASON_LENGTH} characters"
        )));
    }
    Ok(())
}
