//! Case lifecycle statuses and the role-scoped transition table.
//!
//! [`TRANSITIONS`] is the only place legal status changes are defined. Both
//! the workflow operations (quote, payment, refund) and the generic status
//! endpoint validate against it, and the "allowed next statuses" query reads
//! from it.
//!
//! Status strings must match the CHECK constraint on `cases.status`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;

macro_rules! define_case_statuses {
    (
        $( $(#[$vmeta:meta])* $variant:ident => $name:literal ),+ $(,)?
    ) => {
        /// Canonical case status vocabulary.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum CaseStatus {
            $( $(#[$vmeta])* $variant ),+
        }

        impl CaseStatus {
            /// Every status, in lifecycle order.
            pub const ALL: &'static [CaseStatus] = &[ $( CaseStatus::$variant ),+ ];

            /// The database / wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( CaseStatus::$variant => $name ),+
                }
            }
        }

        impl FromStr for CaseStatus {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(CaseStatus::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Unknown case status '{other}'"
                    ))),
                }
            }
        }
    };
}

define_case_statuses! {
    Draft => "draft",
    Submitted => "submitted",
    /// Study-fee proof uploaded, awaiting admin verification.
    PendingStudyPayment => "pending_study_payment",
    /// Study-fee proof picked up for review by an admin.
    PendingStudyPaymentVerification => "pending_study_payment_verification",
    StudyInProgress => "study_in_progress",
    StudyCompleted => "study_completed",
    QuotePending => "quote_pending",
    QuoteSent => "quote_sent",
    QuoteAccepted => "quote_accepted",
    QuoteRejected => "quote_rejected",
    /// Production-fee proof uploaded, awaiting admin verification.
    PendingProductionPayment => "pending_production_payment",
    /// Production-fee proof picked up for review by an admin.
    PendingProductionPaymentVerification => "pending_production_payment_verification",
    InProduction => "in_production",
    /// Production paused waiting on the client.
    PendingResponse => "pending_response",
    ProductionCompleted => "production_completed",
    ReadyForPickup => "ready_for_pickup",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Completed => "completed",
    Cancelled => "cancelled",
    RefundRequested => "refund_requested",
    Refunded => "refunded",
}

impl CaseStatus {
    /// Terminal statuses have no outgoing edges in the table.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaseStatus::Completed | CaseStatus::Cancelled | CaseStatus::Refunded
        )
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------------------------------------------------
Transition table
-------------------------------------------------------------------------- */

/// Which side of the workflow may take an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Client,
    /// Designers and admins.
    Staff,
}

impl Scope {
    pub fn for_role(role: Role) -> Self {
        if role.is_staff() {
            Scope::Staff
        } else {
            Scope::Client
        }
    }
}

/// How an edge is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Through the generic status endpoint.
    Manual,
    /// Only as the side effect of a dedicated operation (submission, quote,
    /// payment, refund), which carries its own bookkeeping.
    Workflow,
}

/// One legal status change.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: CaseStatus,
    pub to: CaseStatus,
    pub scope: Scope,
    pub trigger: Trigger,
}

const fn edge(from: CaseStatus, to: CaseStatus, scope: Scope, trigger: Trigger) -> Edge {
    Edge {
        from,
        to,
        scope,
        trigger,
    }
}

use CaseStatus as S;
use Scope::{Client as C, Staff as F};
use Trigger::{Manual as M, Workflow as W};

/// The complete transition table.
pub const TRANSITIONS: &[Edge] = &[
    // --- client: intake & study payment ---
    edge(S::Draft, S::Submitted, C, W),
    edge(S::Draft, S::PendingStudyPayment, C, W),
    edge(S::Draft, S::Cancelled, C, M),
    edge(S::Submitted, S::Cancelled, C, M),
    edge(S::PendingStudyPayment, S::Cancelled, C, M),
    // --- client: quote response ---
    edge(S::QuoteSent, S::QuoteAccepted, C, W),
    edge(S::QuoteSent, S::QuoteRejected, C, W),
    edge(S::QuoteSent, S::Cancelled, C, W),
    edge(S::QuoteRejected, S::Cancelled, C, M),
    edge(S::QuoteAccepted, S::PendingProductionPayment, C, W),
    edge(S::QuoteAccepted, S::Cancelled, C, M),
    // --- client: production & delivery ---
    edge(S::PendingResponse, S::InProduction, C, M),
    edge(S::InProduction, S::RefundRequested, C, W),
    edge(S::PendingResponse, S::RefundRequested, C, W),
    edge(S::ProductionCompleted, S::RefundRequested, C, W),
    edge(S::ReadyForPickup, S::Delivered, C, M),
    edge(S::OutForDelivery, S::Delivered, C, M),
    edge(S::Delivered, S::Completed, C, M),
    // --- staff: study ---
    edge(S::PendingStudyPayment, S::PendingStudyPaymentVerification, F, M),
    edge(S::PendingStudyPayment, S::Submitted, F, W),
    edge(S::PendingStudyPaymentVerification, S::Submitted, F, W),
    edge(S::Submitted, S::StudyInProgress, F, M),
    edge(S::Submitted, S::Cancelled, F, M),
    edge(S::StudyInProgress, S::StudyCompleted, F, M),
    edge(S::StudyInProgress, S::Cancelled, F, M),
    edge(S::StudyCompleted, S::Cancelled, F, M),
    // --- staff: quoting ---
    edge(S::StudyCompleted, S::QuoteSent, F, W),
    edge(S::QuotePending, S::StudyCompleted, F, M),
    edge(S::QuotePending, S::Cancelled, F, M),
    edge(S::QuoteRejected, S::QuoteSent, F, W),
    edge(S::QuoteRejected, S::Cancelled, F, M),
    // --- staff: production payment ---
    edge(S::PendingProductionPayment, S::PendingProductionPaymentVerification, F, M),
    edge(S::PendingProductionPayment, S::InProduction, F, W),
    edge(S::PendingProductionPayment, S::QuoteAccepted, F, W),
    edge(S::PendingProductionPaymentVerification, S::InProduction, F, W),
    edge(S::PendingProductionPaymentVerification, S::QuoteAccepted, F, W),
    // --- staff: production & delivery ---
    edge(S::InProduction, S::PendingResponse, F, M),
    edge(S::InProduction, S::ProductionCompleted, F, M),
    edge(S::PendingResponse, S::InProduction, F, M),
    edge(S::ProductionCompleted, S::ReadyForPickup, F, M),
    edge(S::ProductionCompleted, S::OutForDelivery, F, M),
    edge(S::ReadyForPickup, S::Delivered, F, M),
    edge(S::OutForDelivery, S::Delivered, F, M),
    edge(S::Delivered, S::Completed, F, M),
    // --- staff: refunds ---
    edge(S::RefundRequested, S::Refunded, F, W),
    edge(S::RefundRequested, S::InProduction, F, W),
];

fn collect(role: Role, from: CaseStatus, manual_only: bool) -> Vec<CaseStatus> {
    let scope = Scope::for_role(role);
    let mut out = Vec::new();
    for e in TRANSITIONS {
        if e.from == from
            && e.scope == scope
            && (!manual_only || e.trigger == Trigger::Manual)
            && !out.contains(&e.to)
        {
            out.push(e.to);
        }
    }
    out
}

/// Every status `role` may move a case to from `from`, by any trigger.
pub fn allowed_transitions(role: Role, from: CaseStatus) -> Vec<CaseStatus> {
    collect(role, from, false)
}

/// Statuses reachable from `from` through the generic status endpoint.
pub fn manual_transitions(role: Role, from: CaseStatus) -> Vec<CaseStatus> {
    collect(role, from, true)
}

fn invalid(from: CaseStatus, to: CaseStatus, allowed: Vec<CaseStatus>) -> CoreError {
    CoreError::InvalidTransition {
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
        allowed: allowed.iter().map(|s| s.as_str().to_string()).collect(),
    }
}

/// Validate a transition performed as part of a workflow operation.
pub fn validate_transition(role: Role, from: CaseStatus, to: CaseStatus) -> Result<(), CoreError> {
    let allowed = allowed_transitions(role, from);
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(invalid(from, to, allowed))
    }
}

/// Validate a transition requested through the generic status endpoint.
pub fn validate_manual_transition(
    role: Role,
    from: CaseStatus,
    to: CaseStatus,
) -> Result<(), CoreError> {
    let allowed = manual_transitions(role, from);
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(invalid(from, to, allowed))
    }
}

/* --------------------------------------------------------------------------
Admin override
-------------------------------------------------------------------------- */

/// Prefix written to the history note of every override.
pub const OVERRIDE_NOTE_PREFIX: &str = "admin override";

/// Maximum length of an override reason.
pub const MAX_OVERRIDE_REASON_LENGTH: usize = 2_000;

/// Validate an admin override and build the history note for it.
///
/// Overrides skip the transition table but still need a reason and a real
/// change of status.
pub fn validate_override(
    from: CaseStatus,
    to: CaseStatus,
    reason: &str,
) -> Result<String, CoreError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CoreError::Validation(
            "An override reason is required".to_string(),
        ));
    }
    if reason.len() > MAX_OVERRIDE_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "Override reason exceeds maximum length of {MAX_OVERRIDE_REASON_LENGTH} characters"
        )));
    }
    if from == to {
        return Err(CoreError::InvalidState(format!(
            "Case is already '{from}'"
        )));
    }
    Ok(format!("{OVERRIDE_NOTE_PREFIX}: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_strings_round_trip() {
        for status in CaseStatus::ALL {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), *status);
        }
        assert_eq!(CaseStatus::ALL.len(), 22);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_matches!(
            "shipped".parse::<CaseStatus>(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in CaseStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for role in [Role::Client, Role::Designer, Role::Admin] {
                assert!(
                    allowed_transitions(role, *status).is_empty(),
                    "{status} should be terminal for {role}"
                );
            }
        }
    }

    #[test]
    fn table_never_contains_self_loops() {
        assert!(TRANSITIONS.iter().all(|e| e.from != e.to));
    }

    #[test]
    fn client_can_accept_or_reject_a_sent_quote() {
        assert!(validate_transition(Role::Client, S::QuoteSent, S::QuoteAccepted).is_ok());
        assert!(validate_transition(Role::Client, S::QuoteSent, S::QuoteRejected).is_ok());
        assert!(validate_transition(Role::Designer, S::QuoteSent, S::QuoteAccepted).is_err());
    }

    #[test]
    fn quote_edges_are_not_manual() {
        let err =
            validate_manual_transition(Role::Client, S::QuoteSent, S::QuoteAccepted).unwrap_err();
        assert_matches!(err, CoreError::InvalidTransition { allowed, .. } => {
            assert!(allowed.is_empty());
        });
    }

    #[test]
    fn invalid_transition_reports_allowed_set() {
        let err = validate_manual_transition(Role::Designer, S::Submitted, S::Delivered)
            .unwrap_err();
        assert_matches!(err, CoreError::InvalidTransition { from, to, allowed } => {
            assert_eq!(from, "submitted");
            assert_eq!(to, "delivered");
            assert_eq!(allowed, vec!["study_in_progress".to_string(), "cancelled".to_string()]);
        });
    }

    #[test]
    fn designer_and_admin_share_the_staff_table() {
        for status in CaseStatus::ALL {
            assert_eq!(
                allowed_transitions(Role::Designer, *status),
                allowed_transitions(Role::Admin, *status)
            );
        }
    }

    #[test]
    fn payment_verification_edges_belong_to_staff() {
        assert!(validate_transition(Role::Admin, S::PendingStudyPayment, S::Submitted).is_ok());
        assert!(validate_transition(Role::Client, S::PendingStudyPayment, S::Submitted).is_err());
        assert!(
            validate_transition(Role::Admin, S::PendingProductionPayment, S::InProduction).is_ok()
        );
        assert!(
            validate_transition(Role::Admin, S::PendingProductionPayment, S::QuoteAccepted)
                .is_ok()
        );
    }

    #[test]
    fn refund_decisions_leave_refund_requested() {
        assert!(validate_transition(Role::Admin, S::RefundRequested, S::Refunded).is_ok());
        assert!(validate_transition(Role::Admin, S::RefundRequested, S::InProduction).is_ok());
        assert!(validate_transition(Role::Client, S::RefundRequested, S::Refunded).is_err());
    }

    #[test]
    fn override_requires_reason() {
        assert_matches!(
            validate_override(S::Cancelled, S::InProduction, "   "),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn override_rejects_no_op() {
        assert_matches!(
            validate_override(S::InProduction, S::InProduction, "fix"),
            Err(CoreError::InvalidState(_))
        );
    }

    #[test]
    fn override_note_is_tagged() {
        let note = validate_override(S::Cancelled, S::InProduction, " client paid late ").unwrap();
        assert_eq!(note, "admin override: client paid late");
    }
}
