//! Authorization policy keyed by `(role, action, ownership)`.
//!
//! Every handler evaluates [`authorize`] before running an operation. Clients
//! act on their own cases only; designers work cases; admins additionally
//! price, verify, refund and override.

use crate::error::CoreError;
use crate::roles::Role;

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCase,
    UpdateDraft,
    DeleteDraft,
    SubmitCase,
    ViewCase,
    ListAllCases,
    ChangeStatus,
    OverrideStatus,
    CreateQuote,
    ReviseQuote,
    ViewQuote,
    RespondToQuote,
    ApplyDiscount,
    ValidateDiscountCode,
    ManageDiscountCodes,
    UploadPayment,
    ViewPayments,
    ReviewPayment,
    RequestRefund,
    ReviewRefund,
}

/// Relationship between the caller and the case the action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The caller's client profile owns the case.
    Owner,
    /// The case belongs to someone else.
    Other,
    /// The action does not target a single case.
    NotApplicable,
}

impl Ownership {
    pub fn of(is_owner: bool) -> Self {
        if is_owner {
            Ownership::Owner
        } else {
            Ownership::Other
        }
    }
}

fn client_may(action: Action) -> bool {
    matches!(
        action,
        Action::CreateCase
            | Action::UpdateDraft
            | Action::DeleteDraft
            | Action::SubmitCase
            | Action::ViewCase
            | Action::ChangeStatus
            | Action::ViewQuote
            | Action::RespondToQuote
            | Action::ApplyDiscount
            | Action::ValidateDiscountCode
            | Action::UploadPayment
            | Action::ViewPayments
            | Action::RequestRefund
    )
}

fn designer_may(action: Action) -> bool {
    matches!(
        action,
        Action::ViewCase
            | Action::ListAllCases
            | Action::ChangeStatus
            | Action::ViewQuote
            | Action::ViewPayments
    )
}

fn admin_may(action: Action) -> bool {
    // Actions that speak for the client stay with the client.
    !matches!(
        action,
        Action::CreateCase
            | Action::UpdateDraft
            | Action::DeleteDraft
            | Action::SubmitCase
            | Action::RespondToQuote
            | Action::UploadPayment
            | Action::RequestRefund
            | Action::ValidateDiscountCode
    )
}

/// Decide whether `role` may perform `action` on a resource with the given
/// ownership.
pub fn authorize(role: Role, action: Action, ownership: Ownership) -> Result<(), CoreError> {
    let permitted = match role {
        Role::Client => client_may(action) && ownership != Ownership::Other,
        Role::Designer => designer_may(action),
        Role::Admin => admin_may(action),
    };
    if permitted {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{role}' is not allowed to perform {action:?}"
        )))
    }
}
