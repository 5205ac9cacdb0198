//! Repository for the immutable `discount_usages` table.

use sqlx::PgExecutor;
use surgiguide_core::types::DbId;

use crate::models::discount::{DiscountUsage, NewDiscountUsage};

const COLUMNS: &str = "id, discount_code_id, client_profile_id, case_id, quote_id, \
    original_amount, discount_amount, final_amount, applied_at";

/// Records and reads discount usages. Rows are never updated.
pub struct DiscountUsageRepo;

impl DiscountUsageRepo {
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &NewDiscountUsage,
    ) -> Result<DiscountUsage, sqlx::Error> {
        let query = format!(
            "INSERT INTO discount_usages \
                (discount_code_id, client_profile_id, case_id, quote_id, \
                 original_amount, discount_amount, final_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DiscountUsage>(&query)
            .bind(input.discount_code_id)
            .bind(input.client_profile_id)
            .bind(input.case_id)
            .bind(input.quote_id)
            .bind(input.original_amount)
            .bind(input.discount_amount)
            .bind(input.final_amount)
            .fetch_one(executor)
            .await
    }

    /// How many times a client has used a code.
    pub async fn count_for_client(
        executor: impl PgExecutor<'_>,
        discount_code_id: DbId,
        client_profile_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM discount_usages \
             WHERE discount_code_id = $1 AND client_profile_id = $2",
        )
        .bind(discount_code_id)
        .bind(client_profile_id)
        .fetch_one(executor)
        .await
    }

    /// Usages of a code, newest first.
    pub async fn list_for_code(
        executor: impl PgExecutor<'_>,
        discount_code_id: DbId,
    ) -> Result<Vec<DiscountUsage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM discount_usages \
             WHERE discount_code_id = $1 \
             ORDER BY applied_at DESC, id DESC"
        );
        sqlx::query_as::<_, DiscountUsage>(&query)
            .bind(discount_code_id)
            .fetch_all(executor)
            .await
    }
}
