//! Route definitions for the `/cases` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{cases, payments, quotes};
use crate::state::AppState;

/// Routes mounted at `/cases`.
///
/// ```text
/// GET    /                      -> list_cases
/// POST   /                      -> create_case
/// GET    /{id}                  -> get_case
/// PUT    /{id}                  -> update_case
/// DELETE /{id}                  -> delete_case
/// POST   /{id}/submit           -> submit_case
/// POST   /{id}/status           -> change_status
/// GET    /{id}/transitions      -> allowed_transitions
/// GET    /{id}/history          -> case_history
/// GET    /{id}/quotes           -> list_quotes
/// POST   /{id}/quotes           -> create_quote
/// GET    /{id}/payments         -> list_payments
/// POST   /{id}/payments         -> upload_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cases::list_cases).post(cases::create_case))
        .route(
            "/{id}",
            get(cases::get_case)
                .put(cases::update_case)
                .delete(cases::delete_case),
        )
        .route("/{id}/submit", post(cases::submit_case))
        .route("/{id}/status", post(cases::change_status))
        .route("/{id}/transitions", get(cases::allowed_transitions))
        .route("/{id}/history", get(cases::case_history))
        .route(
            "/{id}/quotes",
            get(quotes::list_quotes).post(quotes::create_quote),
        )
        .route(
            "/{id}/payments",
            get(payments::list_payments).post(payments::upload_payment),
        )
}
