//! Route definitions for the `/quotes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::quotes;
use crate::state::AppState;

/// Routes mounted at `/quotes`.
///
/// ```text
/// GET    /{id}                  -> get_quote
/// POST   /{id}/accept           -> accept_quote
/// POST   /{id}/reject           -> reject_quote
/// POST   /{id}/revise           -> revise_quote
/// POST   /{id}/discount         -> apply_discount
/// DELETE /{id}/discount         -> remove_discount
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(quotes::get_quote))
        .route("/{id}/accept", post(quotes::accept_quote))
        .route("/{id}/reject", post(quotes::reject_quote))
        .route("/{id}/revise", post(quotes::revise_quote))
        .route(
            "/{id}/discount",
            post(quotes::apply_discount).delete(quotes::remove_discount),
        )
}
