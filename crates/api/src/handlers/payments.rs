//! Handlers for payments: `/cases/{id}/payments` and `/payments/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use surgiguide_core::error::CoreError;
use surgiguide_core::payment::PaymentType;
use surgiguide_core::policy::Action;
use surgiguide_core::types::{DbId, Money};
use surgiguide_db::repositories::PaymentRepo;

use crate::error::AppResult;
use crate::handlers::load_case;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::payments;

/* --------------------------------------------------------------------------
   Request types
   -------------------------------------------------------------------------- */

/// Body of `POST /cases/{id}/payments`.
#[derive(Debug, Deserialize, Validate)]
pub struct UploadPaymentRequest {
    pub payment_type: String,
    pub amount: Money,
    #[validate(length(min = 1, max = 2048))]
    pub proof_url: String,
    #[validate(length(max = 200))]
    pub proof_reference: Option<String>,
    #[validate(length(max = 2000))]
    pub payer_notes: Option<String>,
}

/// Body of `POST /payments/{id}/reject` and `POST /payments/{id}/refund-request`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReasonRequest {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

/// Body of `POST /payments/{id}/refund/approve`.
#[derive(Debug, Deserialize, Validate)]
pub struct ApproveRefundRequest {
    pub amount: Money,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Body of `POST /payments/{id}/refund/reject`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectRefundRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /cases/{id}/payments
pub async fn list_payments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = load_case(&state, &user, case_id, Action::ViewPayments).await?;
    let payments = PaymentRepo::list_for_case(&state.pool, case.id).await?;
    Ok(Json(DataResponse { data: payments }))
}

/// POST /cases/{id}/payments
///
/// Record a payment proof for the study or production fee.
pub async fn upload_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<UploadPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let payment_type = input.payment_type.parse::<PaymentType>()?;

    let payment = payments::upload_payment(
        &state,
        &user,
        case_id,
        &payments::UploadInput {
            payment_type,
            amount: input.amount,
            proof_url: input.proof_url,
            proof_reference: input.proof_reference,
            payer_notes: input.payer_notes,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: payment })))
}

/// GET /payments/{id}
pub async fn get_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let payment = PaymentRepo::find_by_id(&state.pool, payment_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Payment",
            id: payment_id,
        })?;
    load_case(&state, &user, payment.case_id, Action::ViewPayments).await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /payments/{id}/verify
pub async fn verify_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let payment = payments::verify_payment(&state, &user, payment_id).await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /payments/{id}/reject
pub async fn reject_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let payment = payments::reject_payment(&state, &user, payment_id, &input.reason).await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /payments/{id}/refund-request
pub async fn request_refund(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let payment = payments::request_refund(&state, &user, payment_id, &input.reason).await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /payments/{id}/refund/approve
pub async fn approve_refund(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
    Json(input): Json<ApproveRefundRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let payment = payments::approve_refund(
        &state,
        &user,
        payment_id,
        input.amount,
        input.notes.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: payment }))
}

/// POST /payments/{id}/refund/reject
pub async fn reject_refund(
    user: AuthUser,
    State(state): State<AppState>,
    Path(payment_id): Path<DbId>,
    Json(input): Json<RejectRefundRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let payment =
        payments::reject_refund(&state, &user, payment_id, input.notes.as_deref()).await?;
    Ok(Json(DataResponse { data: payment }))
}
