//! Handlers for the `/cases` resource: intake, status and history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use surgiguide_core::case_status::{manual_transitions, CaseStatus};
use surgiguide_core::policy::Action;
use surgiguide_core::roles::Role;
use surgiguide_core::types::DbId;
use surgiguide_db::models::case::{CaseListFilter, CreateCase, UpdateCase};
use surgiguide_db::repositories::{CaseHistoryRepo, CaseRepo};

use crate::error::AppResult;
use crate::handlers::load_case;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::authorize;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::cases;

/* --------------------------------------------------------------------------
   Request / response types
   -------------------------------------------------------------------------- */

/// Query parameters for `GET /cases`.
#[derive(Debug, Deserialize)]
pub struct CaseListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body of `POST /cases` and `PUT /cases/{id}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CaseIntakeRequest {
    pub procedure_category: Option<String>,
    pub guide_type: Option<String>,
    pub required_service: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub patient_reference: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
}

impl From<CaseIntakeRequest> for CreateCase {
    fn from(r: CaseIntakeRequest) -> Self {
        CreateCase {
            procedure_category: r.procedure_category,
            guide_type: r.guide_type,
            required_service: r.required_service,
            patient_reference: r.patient_reference,
            notes: r.notes,
        }
    }
}

impl From<CaseIntakeRequest> for UpdateCase {
    fn from(r: CaseIntakeRequest) -> Self {
        UpdateCase {
            procedure_category: r.procedure_category,
            guide_type: r.guide_type,
            required_service: r.required_service,
            patient_reference: r.patient_reference,
            notes: r.notes,
        }
    }
}

/// Body of `POST /cases/{id}/status`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: String,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Response of `GET /cases/{id}/transitions`.
#[derive(Debug, Serialize)]
pub struct TransitionsResponse {
    pub current: CaseStatus,
    pub allowed: Vec<CaseStatus>,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /cases
///
/// Clients see their own cases, drafts included. Staff see every submitted
/// case. Both may filter by `status`.
pub async fn list_cases(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CaseListQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &params.status {
        status.parse::<CaseStatus>()?;
    }

    let filter = match user.role {
        Role::Client => CaseListFilter {
            client_profile_id: Some(user.profile_id),
            status: params.status,
            exclude_drafts: false,
        },
        Role::Designer | Role::Admin => {
            authorize(&user, Action::ListAllCases)?;
            CaseListFilter {
                client_profile_id: None,
                status: params.status,
                exclude_drafts: true,
            }
        }
    };

    let pagination = crate::query::PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let cases =
        CaseRepo::list(&state.pool, &filter, pagination.limit(), pagination.offset()).await?;
    Ok(Json(DataResponse { data: cases }))
}

/// POST /cases
pub async fn create_case(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CaseIntakeRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let case = cases::create_draft(&state, &user, &input.into()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: case })))
}

/// GET /cases/{id}
pub async fn get_case(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = load_case(&state, &user, case_id, Action::ViewCase).await?;
    Ok(Json(DataResponse { data: case }))
}

/// PUT /cases/{id}
///
/// Edit a draft. Absent fields are left unchanged.
pub async fn update_case(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<CaseIntakeRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let case = cases::update_draft(&state, &user, case_id, &input.into()).await?;
    Ok(Json(DataResponse { data: case }))
}

/// DELETE /cases/{id}
pub async fn delete_case(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    cases::delete_draft(&state, &user, case_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cases/{id}/submit
pub async fn submit_case(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = cases::submit_case(&state, &user, case_id).await?;
    Ok(Json(DataResponse { data: case }))
}

/// POST /cases/{id}/status
pub async fn change_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<ChangeStatusRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let to = input.status.parse::<CaseStatus>()?;
    let note = input.note.filter(|n| !n.trim().is_empty());
    let case = cases::change_status(&state, &user, case_id, to, note).await?;
    Ok(Json(DataResponse { data: case }))
}

/// GET /cases/{id}/transitions
///
/// Statuses the caller may move the case to through `POST /cases/{id}/status`.
pub async fn allowed_transitions(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = load_case(&state, &user, case_id, Action::ViewCase).await?;
    let current = case.case_status()?;
    Ok(Json(DataResponse {
        data: TransitionsResponse {
            current,
            allowed: manual_transitions(user.role, current),
        },
    }))
}

/// GET /cases/{id}/history
pub async fn case_history(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = load_case(&state, &user, case_id, Action::ViewCase).await?;
    let history = CaseHistoryRepo::list_for_case(&state.pool, case.id).await?;
    Ok(Json(DataResponse { data: history }))
}
