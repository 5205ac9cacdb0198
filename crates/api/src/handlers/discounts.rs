//! Client-facing discount code check.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use surgiguide_core::types::Money;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::discounts;

/// Body of `POST /discount-codes/validate`.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCodeRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub order_amount: Money,
}

/// POST /discount-codes/validate
///
/// Report what the code would take off an order of `order_amount` for the
/// calling client. Nothing is reserved.
pub async fn validate_code(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ValidateCodeRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let preview =
        discounts::validate_code(&state, &user, &input.code, input.order_amount).await?;
    Ok(Json(DataResponse { data: preview }))
}
