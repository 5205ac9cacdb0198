//! Route definitions for the client-facing `/discount-codes` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::discounts;
use crate::state::AppState;

/// Routes mounted at `/discount-codes`.
pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(discounts::validate_code))
}
