pub mod admin;
pub mod cases;
pub mod discounts;
pub mod health;
pub mod notification;
pub mod payments;
pub mod quotes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /cases                                           list, create draft
/// /cases/{id}                                      get, update draft, delete draft
/// /cases/{id}/submit                               submit (POST)
/// /cases/{id}/status                               manual status change (POST)
/// /cases/{id}/transitions                          statuses reachable by the caller (GET)
/// /cases/{id}/history                              status history (GET)
/// /cases/{id}/quotes                               list, create (GET, POST)
/// /cases/{id}/payments                             list, upload proof (GET, POST)
///
/// /quotes/{id}                                     get
/// /quotes/{id}/accept                              accept (POST)
/// /quotes/{id}/reject                              reject (POST)
/// /quotes/{id}/revise                              revise (POST)
/// /quotes/{id}/discount                            apply, remove (POST, DELETE)
///
/// /discount-codes/validate                         check a code (POST)
///
/// /payments/{id}                                   get
/// /payments/{id}/verify                            verify (POST, admin)
/// /payments/{id}/reject                            reject (POST, admin)
/// /payments/{id}/refund-request                    request refund (POST)
/// /payments/{id}/refund/approve                    approve refund (POST, admin)
/// /payments/{id}/refund/reject                     reject refund (POST, admin)
///
/// /admin/cases/{id}/override-status                force a status (POST)
/// /admin/payments/pending                          review queue (GET)
/// /admin/payments/refund-requests                  open refund requests (GET)
/// /admin/discount-codes                            list, create (GET, POST)
/// /admin/discount-codes/{id}                       get, update, deactivate
/// /admin/discount-codes/{id}/usages                recorded usages (GET)
///
/// /notifications                                   list (?unread_only, limit, offset)
/// /notifications/read-all                          mark all read (POST)
/// /notifications/unread-count                      unread count (GET)
/// /notifications/{id}/read                         mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Case intake, workflow and per-case sub-resources.
        .nest("/cases", cases::router())
        // Quote responses, revisions and discounts.
        .nest("/quotes", quotes::router())
        .nest("/discount-codes", discounts::router())
        // Payment review and refunds.
        .nest("/payments", payments::router())
        // Admin-only queues, overrides and discount code management.
        .nest("/admin", admin::router())
        // In-app notifications.
        .nest("/notifications", notification::router())
}
