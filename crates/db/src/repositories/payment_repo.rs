//! Repository for the `payments` table.

use sqlx::PgExecutor;
use surgiguide_core::payment::PaymentType;
use surgiguide_core::types::{DbId, Money};

use crate::models::payment::{NewPayment, Payment};

/// Column list for `payments` queries.
const COLUMNS: &str = "id, case_id, quote_id, payment_type, amount, status, proof_url, \
    proof_reference, payer_notes, verified_by_id, verified_at, rejection_reason, \
    refund_requested_at, refund_reason, is_refunded, refunded_amount, refunded_at, \
    refund_notes, created_at, updated_at";

/// Provides payment persistence and the review / refund state changes.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record an uploaded proof as a pending payment.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewPayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments \
                (case_id, quote_id, payment_type, amount, proof_url, proof_reference, payer_notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(input.case_id)
            .bind(input.quote_id)
            .bind(input.payment_type.as_str())
            .bind(input.amount)
            .bind(&input.proof_url)
            .bind(&input.proof_reference)
            .bind(&input.payer_notes)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a payment and lock its row until the transaction ends.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_case(
        executor: impl PgExecutor<'_>,
        case_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE case_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(case_id)
            .fetch_all(executor)
            .await
    }

    /// Payments waiting for admin review, oldest first.
    pub async fn list_pending(executor: impl PgExecutor<'_>) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE status = 'pending' ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Payment>(&query).fetch_all(executor).await
    }

    /// Payments with an unanswered refund request, oldest first.
    pub async fn list_open_refund_requests(
        executor: impl PgExecutor<'_>,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments \
             WHERE refund_requested_at IS NOT NULL AND is_refunded = false \
             ORDER BY refund_requested_at ASC, id ASC"
        );
        sqlx::query_as::<_, Payment>(&query).fetch_all(executor).await
    }

    /// Whether the case already has a non-failed payment of this type.
    pub async fn has_open_payment(
        executor: impl PgExecutor<'_>,
        case_id: DbId,
        payment_type: PaymentType,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (\
                SELECT 1 FROM payments \
                WHERE case_id = $1 AND payment_type = $2 AND status <> 'failed')",
        )
        .bind(case_id)
        .bind(payment_type.as_str())
        .fetch_one(executor)
        .await
    }

    pub async fn mark_verified(
        executor: impl PgExecutor<'_>,
        id: DbId,
        verified_by_id: DbId,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = 'verified', verified_by_id = $2, verified_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(verified_by_id)
            .fetch_one(executor)
            .await
    }

    pub async fn mark_failed(
        executor: impl PgExecutor<'_>,
        id: DbId,
        verified_by_id: DbId,
        reason: &str,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET \
                status = 'failed', verified_by_id = $2, verified_at = NOW(), rejection_reason = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(verified_by_id)
            .bind(reason)
            .fetch_one(executor)
            .await
    }

    pub async fn request_refund(
        executor: impl PgExecutor<'_>,
        id: DbId,
        reason: &str,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET refund_requested_at = NOW(), refund_reason = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(reason)
            .fetch_one(executor)
            .await
    }

    pub async fn approve_refund(
        executor: impl PgExecutor<'_>,
        id: DbId,
        amount: Money,
        notes: Option<&str>,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET \
                status = 'refunded', is_refunded = true, refunded_amount = $2, \
                refunded_at = NOW(), refund_notes = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(amount)
            .bind(notes)
            .fetch_one(executor)
            .await
    }

    /// Close a refund request without refunding. The request fields are
    /// cleared so the client may ask again.
    pub async fn reject_refund(
        executor: impl PgExecutor<'_>,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET \
                refund_requested_at = NULL, refund_reason = NULL, refund_notes = $2 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(notes)
            .fetch_one(executor)
            .await
    }
}
