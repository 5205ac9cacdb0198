//! Repository for the `discount_codes` table.

use sqlx::PgExecutor;
use surgiguide_core::types::DbId;

use crate::models::discount::{CreateDiscountCode, DiscountCode, UpdateDiscountCode};

/// Column list for `discount_codes` queries.
const COLUMNS: &str = "id, code, description, discount_type, discount_value, \
    max_discount_amount, min_order_amount, max_uses_total, max_uses_per_client, \
    valid_from, valid_until, is_active, times_used, deleted_at, created_at, updated_at";

/// Provides CRUD and usage-counter operations for discount codes.
pub struct DiscountCodeRepo;

impl DiscountCodeRepo {
    /// Insert a code. `code` must already be normalized to upper case.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        code: &str,
        input: &CreateDiscountCode,
    ) -> Result<DiscountCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO discount_codes \
                (code, description, discount_type, discount_value, max_discount_amount, \
                 min_order_amount, max_uses_total, max_uses_per_client, valid_from, valid_until, \
                 is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(code)
            .bind(&input.description)
            .bind(input.discount_type.as_str())
            .bind(input.discount_value)
            .bind(input.max_discount_amount)
            .bind(input.min_order_amount)
            .bind(input.max_uses_total)
            .bind(input.max_uses_per_client)
            .bind(input.valid_from)
            .bind(input.valid_until)
            .bind(input.is_active)
            .fetch_one(executor)
            .await
    }

    /// Find a live code by ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<DiscountCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM discount_codes WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a live code by its string, ignoring case.
    pub async fn find_by_code(
        executor: impl PgExecutor<'_>,
        code: &str,
    ) -> Result<Option<DiscountCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM discount_codes \
             WHERE lower(code) = lower($1) AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// Lock a code row until the transaction ends. Soft-deleted codes are
    /// included so an accepted quote can still record its usage.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<DiscountCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM discount_codes WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List live codes, newest first.
    pub async fn list(
        executor: impl PgExecutor<'_>,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DiscountCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM discount_codes \
             WHERE deleted_at IS NULL AND (NOT $1 OR is_active = true) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(active_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Patch a code. Only non-`None` fields change.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &UpdateDiscountCode,
    ) -> Result<Option<DiscountCode>, sqlx::Error> {
        let query = format!(
            "UPDATE discount_codes SET \
                description = COALESCE($2, description), \
                discount_value = COALESCE($3, discount_value), \
                max_discount_amount = COALESCE($4, max_discount_amount), \
                min_order_amount = COALESCE($5, min_order_amount), \
                max_uses_total = COALESCE($6, max_uses_total), \
                max_uses_per_client = COALESCE($7, max_uses_per_client), \
                valid_from = COALESCE($8, valid_from), \
                valid_until = COALESCE($9, valid_until), \
                is_active = COALESCE($10, is_active) \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountCode>(&query)
            .bind(id)
            .bind(&input.description)
            .bind(input.discount_value)
            .bind(input.max_discount_amount)
            .bind(input.min_order_amount)
            .bind(input.max_uses_total)
            .bind(input.max_uses_per_client)
            .bind(input.valid_from)
            .bind(input.valid_until)
            .bind(input.is_active)
            .fetch_optional(executor)
            .await
    }

    /// Soft-delete and deactivate a code. Returns `false` if nothing matched.
    pub async fn soft_delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE discount_codes SET deleted_at = NOW(), is_active = false \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump `times_used` unless the code is at its total cap.
    ///
    /// Returns `false` when the cap was already reached. Callers hold the
    /// row lock from [`Self::find_for_update`].
    pub async fn increment_usage(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE discount_codes SET times_used = times_used + 1 \
             WHERE id = $1 AND (max_uses_total IS NULL OR times_used < max_uses_total)",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
