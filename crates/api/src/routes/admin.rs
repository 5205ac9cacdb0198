//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// POST   /cases/{id}/override-status     -> override_status
/// GET    /payments/pending               -> pending_payments
/// GET    /payments/refund-requests       -> refund_requests
/// GET    /discount-codes                 -> list_discount_codes
/// POST   /discount-codes                 -> create_discount_code
/// GET    /discount-codes/{id}            -> get_discount_code
/// PUT    /discount-codes/{id}            -> update_discount_code
/// DELETE /discount-codes/{id}            -> deactivate_discount_code
/// GET    /discount-codes/{id}/usages     -> discount_code_usages
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/cases/{id}/override-status",
            post(admin::override_status),
        )
        .route("/payments/pending", get(admin::pending_payments))
        .route("/payments/refund-requests", get(admin::refund_requests))
        .route(
            "/discount-codes",
            get(admin::list_discount_codes).post(admin::create_discount_code),
        )
        .route(
            "/discount-codes/{id}",
            get(admin::get_discount_code)
                .put(admin::update_discount_code)
                .delete(admin::deactivate_discount_code),
        )
        .route(
            "/discount-codes/{id}/usages",
            get(admin::discount_code_usages),
        )
}
