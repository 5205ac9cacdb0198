//! Repository for the `case_quotes` table.

use sqlx::PgExecutor;
use surgiguide_core::types::{DbId, Timestamp};

use crate::models::quote::{CaseQuote, NewQuote, QuotePricing};

/// Column list for `case_quotes` queries.
const COLUMNS: &str = "id, case_id, study_fee, design_fee, production_fee, delivery_fee, \
    subtotal, discount_code_id, discount_amount, vat_rate, vat_amount, total_amount, \
    is_sent, sent_at, is_accepted, accepted_at, is_rejected, rejected_at, rejection_reason, \
    revision_requested, revision, valid_until, created_by_designer_id, created_at, updated_at";

/// Provides quote persistence. Totals are always computed by the caller.
pub struct QuoteRepo;

impl QuoteRepo {
    /// Insert a priced quote and mark it sent.
    pub async fn insert_sent(
        executor: impl PgExecutor<'_>,
        input: &NewQuote,
    ) -> Result<CaseQuote, sqlx::Error> {
        let query = format!(
            "INSERT INTO case_quotes \
                (case_id, study_fee, design_fee, production_fee, delivery_fee, \
                 subtotal, discount_amount, vat_rate, vat_amount, total_amount, \
                 is_sent, sent_at, valid_until, created_by_designer_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, true, NOW(), $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(input.case_id)
            .bind(input.fees.study_fee)
            .bind(input.fees.design_fee)
            .bind(input.fees.production_fee)
            .bind(input.fees.delivery_fee)
            .bind(input.totals.subtotal)
            .bind(input.totals.discount_amount)
            .bind(input.vat_rate)
            .bind(input.totals.vat_amount)
            .bind(input.totals.total_amount)
            .bind(input.valid_until)
            .bind(input.created_by_designer_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<CaseQuote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM case_quotes WHERE id = $1");
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a quote and lock its row until the transaction ends.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<CaseQuote>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM case_quotes WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Every quote of a case, newest first.
    pub async fn list_for_case(
        executor: impl PgExecutor<'_>,
        case_id: DbId,
    ) -> Result<Vec<CaseQuote>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM case_quotes WHERE case_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(case_id)
            .fetch_all(executor)
            .await
    }

    /// The accepted quote of a case, if any.
    pub async fn find_accepted_for_case(
        executor: impl PgExecutor<'_>,
        case_id: DbId,
    ) -> Result<Option<CaseQuote>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM case_quotes \
             WHERE case_id = $1 AND is_accepted = true \
             ORDER BY accepted_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(case_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn mark_accepted(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<CaseQuote, sqlx::Error> {
        let query = format!(
            "UPDATE case_quotes SET is_accepted = true, accepted_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn mark_rejected(
        executor: impl PgExecutor<'_>,
        id: DbId,
        reason: &str,
        revision_requested: bool,
    ) -> Result<CaseQuote, sqlx::Error> {
        let query = format!(
            "UPDATE case_quotes SET \
                is_rejected = true, rejected_at = NOW(), \
                rejection_reason = $2, revision_requested = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .bind(reason)
            .bind(revision_requested)
            .fetch_one(executor)
            .await
    }

    /// Replace fees, totals and the attached discount code.
    pub async fn update_pricing(
        executor: impl PgExecutor<'_>,
        id: DbId,
        pricing: &QuotePricing,
    ) -> Result<CaseQuote, sqlx::Error> {
        let query = format!(
            "UPDATE case_quotes SET \
                study_fee = $2, design_fee = $3, production_fee = $4, delivery_fee = $5, \
                subtotal = $6, discount_code_id = $7, discount_amount = $8, \
                vat_rate = $9, vat_amount = $10, total_amount = $11 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .bind(pricing.fees.study_fee)
            .bind(pricing.fees.design_fee)
            .bind(pricing.fees.production_fee)
            .bind(pricing.fees.delivery_fee)
            .bind(pricing.totals.subtotal)
            .bind(pricing.discount_code_id)
            .bind(pricing.totals.discount_amount)
            .bind(pricing.vat_rate)
            .bind(pricing.totals.vat_amount)
            .bind(pricing.totals.total_amount)
            .fetch_one(executor)
            .await
    }

    /// Re-price a rejected quote, clear its rejection and send it again as
    /// the next revision.
    pub async fn revise(
        executor: impl PgExecutor<'_>,
        id: DbId,
        pricing: &QuotePricing,
        valid_until: Option<Timestamp>,
    ) -> Result<CaseQuote, sqlx::Error> {
        let query = format!(
            "UPDATE case_quotes SET \
                study_fee = $2, design_fee = $3, production_fee = $4, delivery_fee = $5, \
                subtotal = $6, discount_code_id = $7, discount_amount = $8, \
                vat_rate = $9, vat_amount = $10, total_amount = $11, \
                valid_until = $12, \
                is_rejected = false, rejected_at = NULL, rejection_reason = NULL, \
                revision_requested = false, revision = revision + 1, \
                is_sent = true, sent_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseQuote>(&query)
            .bind(id)
            .bind(pricing.fees.study_fee)
            .bind(pricing.fees.design_fee)
            .bind(pricing.fees.production_fee)
            .bind(pricing.fees.delivery_fee)
            .bind(pricing.totals.subtotal)
            .bind(pricing.discount_code_id)
            .bind(pricing.totals.discount_amount)
            .bind(pricing.vat_rate)
            .bind(pricing.totals.vat_amount)
            .bind(pricing.totals.total_amount)
            .bind(valid_until)
            .fetch_one(executor)
            .await
    }
}
