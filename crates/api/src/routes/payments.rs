//! Route definitions for the `/payments` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// Review and refund decisions are admin-only; the policy check happens in
/// the workflow layer because it needs the owning case.
///
/// ```text
/// GET    /{id}                  -> get_payment
/// POST   /{id}/verify           -> verify_payment
/// POST   /{id}/reject           -> reject_payment
/// POST   /{id}/refund-request   -> request_refund
/// POST   /{id}/refund/approve   -> approve_refund
/// POST   /{id}/refund/reject    -> reject_refund
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(payments::get_payment))
        .route("/{id}/verify", post(payments::verify_payment))
        .route("/{id}/reject", post(payments::reject_payment))
        .route("/{id}/refund-request", post(payments::request_refund))
        .route("/{id}/refund/approve", post(payments::approve_refund))
        .route("/{id}/refund/reject", post(payments::reject_refund))
}
