//! Case intake and status workflow.

use surgiguide_core::case_intake::{ensure_editable, validate_classification, validate_submission};
use surgiguide_core::case_status::{validate_manual_transition, validate_override, CaseStatus};
use surgiguide_core::error::CoreError;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::policy::Action;
use surgiguide_core::types::DbId;
use surgiguide_db::models::case::{Case, CreateCase, UpdateCase};
use surgiguide_db::repositories::CaseRepo;
use surgiguide_events::Audience;

use super::{
    append_history, client_audience, counterpart_audience, lock_case, publish, submit_case_row,
    transition_case,
};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{authorize, authorize_case};
use crate::state::AppState;

/// Create a draft owned by the calling client and record `NULL -> draft`.
pub async fn create_draft(state: &AppState, user: &AuthUser, input: &CreateCase) -> AppResult<Case> {
    authorize(user, Action::CreateCase)?;
    validate_classification(
        input.procedure_category.as_deref(),
        input.guide_type.as_deref(),
        input.required_service.as_deref(),
    )?;

    let mut tx = state.pool.begin().await?;
    let case = CaseRepo::create_draft(&mut tx, user.profile_id, input).await?;
    append_history(
        &mut tx,
        case.id,
        None,
        CaseStatus::Draft,
        user.actor(),
        None,
        false,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        case_id = case.id,
        case_number = %case.case_number,
        client_profile_id = user.profile_id,
        "Draft case created"
    );
    Ok(case)
}

/// Edit the intake fields of a draft.
pub async fn update_draft(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    input: &UpdateCase,
) -> AppResult<Case> {
    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::UpdateDraft, &case)?;
    ensure_editable(case.case_status()?, case.is_draft)?;
    validate_classification(
        input.procedure_category.as_deref(),
        input.guide_type.as_deref(),
        input.required_service.as_deref(),
    )?;

    let updated = CaseRepo::update_draft(&mut *tx, case_id, input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Case",
            id: case_id,
        })?;
    tx.commit().await?;
    Ok(updated)
}

/// Soft-delete a draft.
pub async fn delete_draft(state: &AppState, user: &AuthUser, case_id: DbId) -> AppResult<()> {
    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::DeleteDraft, &case)?;
    ensure_editable(case.case_status()?, case.is_draft)?;

    if !CaseRepo::soft_delete_draft(&mut *tx, case_id).await? {
        return Err(CoreError::NotFound {
            entity: "Case",
            id: case_id,
        }
        .into());
    }
    tx.commit().await?;

    tracing::info!(case_id, "Draft case deleted");
    Ok(())
}

/// Submit a complete draft: `draft -> submitted`.
pub async fn submit_case(state: &AppState, user: &AuthUser, case_id: DbId) -> AppResult<Case> {
    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::SubmitCase, &case)?;
    validate_submission(
        case.case_status()?,
        case.is_draft,
        case.procedure_category.as_deref(),
        case.guide_type.as_deref(),
        case.required_service.as_deref(),
    )?;

    let updated = submit_case_row(&mut tx, &case, None, user.actor(), None).await?;
    tx.commit().await?;

    publish(
        state,
        NotificationPurpose::CaseSubmitted,
        &updated,
        Audience::Staff { admins_only: false },
        user,
        serde_json::json!({}),
    );
    Ok(updated)
}

/// Generic status change through the manual edges of the transition table.
pub async fn change_status(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    to: CaseStatus,
    note: Option<String>,
) -> AppResult<Case> {
    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::ChangeStatus, &case)?;

    // Workflow-only edges (payments, quotes) are not reachable from here.
    let from = case.case_status()?;
    validate_manual_transition(user.role, from, to)?;

    let updated = transition_case(&mut tx, &case, to, user.actor(), note).await?;
    tx.commit().await?;

    publish(
        state,
        NotificationPurpose::CaseStatusChanged,
        &updated,
        counterpart_audience(user, &updated),
        user,
        serde_json::json!({ "from": from, "to": to }),
    );
    Ok(updated)
}

/// Admin override: any status except the current one, with a reason.
pub async fn override_status(
    state: &AppState,
    user: &AuthUser,
    case_id: DbId,
    to: CaseStatus,
    reason: &str,
) -> AppResult<Case> {
    let mut tx = state.pool.begin().await?;
    let case = lock_case(&mut tx, case_id).await?;
    authorize_case(user, Action::OverrideStatus, &case)?;

    let from = case.case_status()?;
    let note = validate_override(from, to, reason)?;

    let updated = CaseRepo::update_status(&mut *tx, case_id, to).await?;
    append_history(&mut tx, case_id, Some(from), to, user.actor(), Some(note), true).await?;
    tx.commit().await?;

    tracing::warn!(
        case_id,
        from = %from,
        to = %to,
        actor_id = user.profile_id,
        "Case status overridden"
    );

    publish(
        state,
        NotificationPurpose::CaseStatusChanged,
        &updated,
        client_audience(&updated),
        user,
        serde_json::json!({ "from": from, "to": to, "override": true }),
    );
    Ok(updated)
}
