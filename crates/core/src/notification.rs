//! Notification purposes and their plain-text messages.
//!
//! Purpose strings are stored in `notifications.purpose` and used by clients
//! to pick an icon or deep link.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case_status::CaseStatus;
use crate::types::DbId;

/// Language used when a profile has no preference.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Why a notification was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPurpose {
    CaseSubmitted,
    CaseStatusChanged,
    QuoteSent,
    QuoteAccepted,
    QuoteRejected,
    QuoteExpired,
    PaymentUploaded,
    PaymentVerified,
    PaymentRejected,
    RefundRequested,
    RefundApproved,
    RefundRejected,
}

impl NotificationPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationPurpose::CaseSubmitted => "case_submitted",
            NotificationPurpose::CaseStatusChanged => "case_status_changed",
            NotificationPurpose::QuoteSent => "quote_sent",
            NotificationPurpose::QuoteAccepted => "quote_accepted",
            NotificationPurpose::QuoteRejected => "quote_rejected",
            NotificationPurpose::QuoteExpired => "quote_expired",
            NotificationPurpose::PaymentUploaded => "payment_uploaded",
            NotificationPurpose::PaymentVerified => "payment_verified",
            NotificationPurpose::PaymentRejected => "payment_rejected",
            NotificationPurpose::RefundRequested => "refund_requested",
            NotificationPurpose::RefundApproved => "refund_approved",
            NotificationPurpose::RefundRejected => "refund_rejected",
        }
    }
}

impl fmt::Display for NotificationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title and body of a rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

/// Render the message for a purpose about a case.
///
/// `status` is the case status after the change and is only used by
/// [`NotificationPurpose::CaseStatusChanged`].
pub fn render(purpose: NotificationPurpose, case_number: &str, status: CaseStatus) -> Message {
    let (title, body) = match purpose {
        NotificationPurpose::CaseSubmitted => (
            "New case submitted".to_string(),
            format!("Case {case_number} has been submitted and is waiting for review."),
        ),
        NotificationPurpose::CaseStatusChanged => (
            "Case status updated".to_string(),
            format!("Case {case_number} is now '{status}'."),
        ),
        NotificationPurpose::QuoteSent => (
            "Your quote is ready".to_string(),
            format!("A quote for case {case_number} is waiting for your answer."),
        ),
        NotificationPurpose::QuoteAccepted => (
            "Quote accepted".to_string(),
            format!("The client accepted the quote for case {case_number}."),
        ),
        NotificationPurpose::QuoteRejected => (
            "Quote rejected".to_string(),
            format!("The client rejected the quote for case {case_number}."),
        ),
        NotificationPurpose::QuoteExpired => (
            "Quote expired".to_string(),
            format!("The quote for case {case_number} expired and the case was cancelled."),
        ),
        NotificationPurpose::PaymentUploaded => (
            "Payment proof uploaded".to_string(),
            format!("A payment proof for case {case_number} is waiting for verification."),
        ),
        NotificationPurpose::PaymentVerified => (
            "Payment verified".to_string(),
            format!("Your payment for case {case_number} has been verified."),
        ),
        NotificationPurpose::PaymentRejected => (
            "Payment rejected".to_string(),
            format!("Your payment for case {case_number} could not be verified."),
        ),
        NotificationPurpose::RefundRequested => (
            "Refund requested".to_string(),
            format!("The client requested a refund for case {case_number}."),
        ),
        NotificationPurpose::RefundApproved => (
            "Refund approved".to_string(),
            format!("Your refund for case {case_number} has been approved."),
        ),
        NotificationPurpose::RefundRejected => (
            "Refund declined".to_string(),
            format!("Your refund request for case {case_number} was declined."),
        ),
    };
    Message { title, body }
}

/// Deep link to a case, relative to the public app URL.
pub fn case_action_path(case_id: DbId) -> String {
    format!("/cases/{case_id}")
}
