//! Handlers for quotes: `/cases/{id}/quotes` and `/quotes/{id}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use surgiguide_core::error::CoreError;
use surgiguide_core::policy::Action;
use surgiguide_core::quote::FeeBreakdown;
use surgiguide_core::types::{DbId, Money, Timestamp};
use surgiguide_db::repositories::QuoteRepo;

use crate::error::AppResult;
use crate::handlers::load_case;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::{discounts, quotes};

/* --------------------------------------------------------------------------
   Request types
   -------------------------------------------------------------------------- */

/// Body of `POST /cases/{id}/quotes`.
#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub study_fee: Money,
    pub design_fee: Money,
    pub production_fee: Money,
    pub delivery_fee: Money,
    pub vat_rate: Decimal,
    pub valid_until: Option<Timestamp>,
}

/// Body of `POST /quotes/{id}/revise`. Omitted `vat_rate` keeps the current
/// rate.
#[derive(Debug, Deserialize)]
pub struct ReviseQuoteRequest {
    pub study_fee: Money,
    pub design_fee: Money,
    pub production_fee: Money,
    pub delivery_fee: Money,
    pub vat_rate: Option<Decimal>,
    pub valid_until: Option<Timestamp>,
}

/// Body of `POST /quotes/{id}/reject`.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectQuoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
    #[serde(default)]
    pub request_revision: bool,
}

/// Body of `POST /quotes/{id}/discount`.
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyDiscountRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /cases/{id}/quotes
///
/// Every quote of a case, newest first.
pub async fn list_quotes(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let case = load_case(&state, &user, case_id, Action::ViewQuote).await?;
    let quotes = QuoteRepo::list_for_case(&state.pool, case.id).await?;
    Ok(Json(DataResponse { data: quotes }))
}

/// POST /cases/{id}/quotes
pub async fn create_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(case_id): Path<DbId>,
    Json(input): Json<CreateQuoteRequest>,
) -> AppResult<impl IntoResponse> {
    let quote = quotes::create_quote(
        &state,
        &user,
        case_id,
        &quotes::QuoteInput {
            fees: FeeBreakdown {
                study_fee: input.study_fee,
                design_fee: input.design_fee,
                production_fee: input.production_fee,
                delivery_fee: input.delivery_fee,
            },
            vat_rate: input.vat_rate,
            valid_until: input.valid_until,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: quote })))
}

/// GET /quotes/{id}
pub async fn get_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let quote = QuoteRepo::find_by_id(&state.pool, quote_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "CaseQuote",
            id: quote_id,
        })?;
    load_case(&state, &user, quote.case_id, Action::ViewQuote).await?;
    Ok(Json(DataResponse { data: quote }))
}

/// POST /quotes/{id}/accept
pub async fn accept_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let quote = quotes::accept_quote(&state, &user, quote_id).await?;
    Ok(Json(DataResponse { data: quote }))
}

/// POST /quotes/{id}/reject
pub async fn reject_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
    Json(input): Json<RejectQuoteRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let quote =
        quotes::reject_quote(&state, &user, quote_id, &input.reason, input.request_revision)
            .await?;
    Ok(Json(DataResponse { data: quote }))
}

/// POST /quotes/{id}/revise
pub async fn revise_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
    Json(input): Json<ReviseQuoteRequest>,
) -> AppResult<impl IntoResponse> {
    let quote = quotes::revise_quote(
        &state,
        &user,
        quote_id,
        &quotes::RevisionInput {
            fees: FeeBreakdown {
                study_fee: input.study_fee,
                design_fee: input.design_fee,
                production_fee: input.production_fee,
                delivery_fee: input.delivery_fee,
            },
            vat_rate: input.vat_rate,
            valid_until: input.valid_until,
        },
    )
    .await?;
    Ok(Json(DataResponse { data: quote }))
}

/// POST /quotes/{id}/discount
pub async fn apply_discount(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
    Json(input): Json<ApplyDiscountRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let quote = discounts::apply_code(&state, &user, quote_id, &input.code).await?;
    Ok(Json(DataResponse { data: quote }))
}

/// DELETE /quotes/{id}/discount
pub async fn remove_discount(
    user: AuthUser,
    State(state): State<AppState>,
    Path(quote_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let quote = discounts::remove_code(&state, &user, quote_id).await?;
    Ok(Json(DataResponse { data: quote }))
}
