//! Handlers for the `/admin` resource: status overrides, the payment review
//! queues and discount code management.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::types::DbId;
use surgiguide_db::models::discount::{CreateDiscountCode, UpdateDiscountCode};
use surgiguide_db::repositories::PaymentRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::{cases, discounts};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/cases/{id}/override-status`.
#[derive(Debug, Deserialize, Validate)]
pub struct OverrideStatusRequest {
    pub status: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

/// Query parameters for `GET /admin/discount-codes`.
#[derive(Debug, Deserialize)]
pub struct DiscountCodeListQuery {
    #[serde(default)]
    pub active_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

/// POST /admin/cases/{id}/override-status
///
/// Force a case into any other status. The reason is stored in the history
/// row, which is flagged as an override.
pub async fn override_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<OverrideStatusRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let to = input.status.parse::<CaseStatus>()?;
    let case = cases::override_status(&state, &admin, case_id, to, &input.reason).await?;
    Ok(Json(DataResponse { data: case }))
}

// ---------------------------------------------------------------------------
// Payment review queues
// ---------------------------------------------------------------------------

/// GET /admin/payments/pending
pub async fn pending_payments(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let payments = PaymentRepo::list_pending(&state.pool).await?;
    Ok(Json(DataResponse { data: payments }))
}

/// GET /admin/payments/refund-requests
pub async fn refund_requests(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let payments = PaymentRepo::list_open_refund_requests(&state.pool).await?;
    Ok(Json(DataResponse { data: payments }))
}

// ---------------------------------------------------------------------------
// Discount codes
// ---------------------------------------------------------------------------

/// GET /admin/discount-codes
pub async fn list_discount_codes(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<DiscountCodeListQuery>,
) -> AppResult<impl IntoResponse> {
    let pagination = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let codes = discounts::list_codes(
        &state,
        &admin,
        params.active_only,
        pagination.limit(),
        pagination.offset(),
    )
    .await?;
    Ok(Json(DataResponse { data: codes }))
}

/// POST /admin/discount-codes
pub async fn create_discount_code(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateDiscountCode>,
) -> AppResult<impl IntoResponse> {
    let code = discounts::create_code(&state, &admin, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: code })))
}

/// GET /admin/discount-codes/{id}
pub async fn get_discount_code(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let code = discounts::get_code(&state, &admin, id).await?;
    Ok(Json(DataResponse { data: code }))
}

/// PUT /admin/discount-codes/{id}
pub async fn update_discount_code(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDiscountCode>,
) -> AppResult<impl IntoResponse> {
    let code = discounts::update_code(&state, &admin, id, &input).await?;
    Ok(Json(DataResponse { data: code }))
}

/// DELETE /admin/discount-codes/{id}
pub async fn deactivate_discount_code(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    discounts::deactivate_code(&state, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/discount-codes/{id}/usages
pub async fn discount_code_usages(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let usages = discounts::list_usages(&state, &admin, id).await?;
    Ok(Json(DataResponse { data: usages }))
}
