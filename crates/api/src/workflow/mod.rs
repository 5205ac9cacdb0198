//! Transactional workflow operations.
//!
//! Each public function in the submodules runs one database transaction:
//! lock the affected rows, evaluate the policy, validate against the state
//! machine and entity flags, write, commit. Notification events are
//! published on the bus only after the commit succeeds.
//!
//! - [`cases`] -- intake, submission, manual status changes, admin override.
//! - [`quotes`] -- quote creation, acceptance, rejection and revision.
//! - [`discounts`] -- code validation, apply/remove on quotes, administration.
//! - [`payments`] -- proof upload, verification, refunds.

pub mod cases;
pub mod discounts;
pub mod payments;
pub mod quotes;

use sqlx::PgConnection;
use surgiguide_core::case_status::{validate_transition, CaseStatus};
use surgiguide_core::error::CoreError;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::roles::Actor;
use surgiguide_core::types::DbId;
use surgiguide_db::models::case::Case;
use surgiguide_db::models::case_status_history::NewHistoryEntry;
use surgiguide_db::repositories::{CaseHistoryRepo, CaseRepo};
use surgiguide_events::{Audience, PlatformEvent};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a live case and hold its row lock until the transaction ends.
pub(crate) async fn lock_case(conn: &mut PgConnection, id: DbId) -> AppResult<Case> {
    CaseRepo::find_for_update(&mut *conn, id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "Case", id }.into())
}

/// Append one history row.
pub(crate) async fn append_history(
    conn: &mut PgConnection,
    case_id: DbId,
    from_status: Option<CaseStatus>,
    to_status: CaseStatus,
    actor: Actor,
    note: Option<String>,
    is_override: bool,
) -> AppResult<()> {
    CaseHistoryRepo::insert(
        &mut *conn,
        &NewHistoryEntry {
            case_id,
            from_status,
            to_status,
            actor,
            note,
            is_override,
        },
    )
    .await?;
    Ok(())
}

/// Move a locked case to `to` through the transition table.
///
/// Validates the edge for the actor's role, persists the status and appends
/// exactly one history row.
pub(crate) async fn transition_case(
    conn: &mut PgConnection,
    case: &Case,
    to: CaseStatus,
    actor: Actor,
    note: Option<String>,
) -> AppResult<Case> {
    let from = case.case_status()?;
    validate_transition(actor.kind, from, to)?;

    let updated = CaseRepo::update_status(&mut *conn, case.id, to).await?;
    append_history(conn, case.id, Some(from), to, actor, note, false).await?;

    tracing::info!(
        case_id = case.id,
        from = %from,
        to = %to,
        actor_id = actor.id,
        actor_kind = %actor.kind,
        "Case status changed"
    );
    Ok(updated)
}

/// Move a locked case into `submitted`, clearing the draft flag.
///
/// `from_status` is recorded as given: `None` for a direct submission by the
/// client, the previous status when a study payment review submits the case.
pub(crate) async fn submit_case_row(
    conn: &mut PgConnection,
    case: &Case,
    from_status: Option<CaseStatus>,
    actor: Actor,
    note: Option<String>,
) -> AppResult<Case> {
    let from = case.case_status()?;
    validate_transition(actor.kind, from, CaseStatus::Submitted)?;

    let updated = CaseRepo::mark_submitted(&mut *conn, case.id, CaseStatus::Submitted).await?;
    append_history(
        conn,
        case.id,
        from_status,
        CaseStatus::Submitted,
        actor,
        note,
        false,
    )
    .await?;

    tracing::info!(
        case_id = case.id,
        from = %from,
        actor_id = actor.id,
        "Case submitted"
    );
    Ok(updated)
}

/// Publish a notification event about `case` after a commit.
pub(crate) fn publish(
    state: &AppState,
    purpose: NotificationPurpose,
    case: &Case,
    audience: Audience,
    user: &AuthUser,
    payload: serde_json::Value,
) {
    let status = match case.case_status() {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(case_id = case.id, error = %e, "Stored case status is invalid");
            return;
        }
    };
    state.event_bus.publish(
        PlatformEvent::new(purpose, case.id, case.case_number.clone(), status, audience)
            .with_actor(user.user_id)
            .with_payload(payload),
    );
}

/// The client owning `case`.
pub(crate) fn client_audience(case: &Case) -> Audience {
    Audience::Client {
        client_profile_id: case.client_profile_id,
    }
}

/// The party on the other side of the workflow from `user`.
pub(crate) fn counterpart_audience(user: &AuthUser, case: &Case) -> Audience {
    if user.role.is_staff() {
        client_audience(case)
    } else {
        Audience::Staff { admins_only: false }
    }
}
