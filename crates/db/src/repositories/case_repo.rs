//! Repository for the `cases` table.

use sqlx::{PgConnection, PgExecutor};
use surgiguide_core::case_intake::format_case_number;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::types::DbId;

use crate::models::case::{Case, CaseListFilter, CreateCase, UpdateCase};

/// Column list for `cases` queries.
const COLUMNS: &str = "id, client_profile_id, case_number, status, is_draft, \
    procedure_category, guide_type, required_service, patient_reference, notes, \
    submitted_at, delivered_at, deleted_at, created_at, updated_at";

/// Provides CRUD and status operations for cases.
pub struct CaseRepo;

impl CaseRepo {
    /// Insert a new draft case with a freshly allocated case number.
    pub async fn create_draft(
        conn: &mut PgConnection,
        client_profile_id: DbId,
        input: &CreateCase,
    ) -> Result<Case, sqlx::Error> {
        let (year, seq): (i32, i64) = sqlx::query_as(
            "SELECT EXTRACT(YEAR FROM NOW())::int, nextval('case_number_seq')",
        )
        .fetch_one(&mut *conn)
        .await?;

        let query = format!(
            "INSERT INTO cases \
                (client_profile_id, case_number, procedure_category, guide_type, \
                 required_service, patient_reference, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(client_profile_id)
            .bind(format_case_number(year, seq))
            .bind(&input.procedure_category)
            .bind(&input.guide_type)
            .bind(&input.required_service)
            .bind(&input.patient_reference)
            .bind(&input.notes)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a live (not soft-deleted) case by ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Case>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cases WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a live case and lock its row until the transaction ends.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cases WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List live cases, newest first.
    pub async fn list(
        executor: impl PgExecutor<'_>,
        filter: &CaseListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cases \
             WHERE deleted_at IS NULL \
               AND ($1::BIGINT IS NULL OR client_profile_id = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
               AND (NOT $3 OR status <> 'draft') \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(filter.client_profile_id)
            .bind(&filter.status)
            .bind(filter.exclude_drafts)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Patch the editable fields of a draft. Only non-`None` fields change.
    pub async fn update_draft(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &UpdateCase,
    ) -> Result<Option<Case>, sqlx::Error> {
        let query = format!(
            "UPDATE cases SET \
                procedure_category = COALESCE($2, procedure_category), \
                guide_type = COALESCE($3, guide_type), \
                required_service = COALESCE($4, required_service), \
                patient_reference = COALESCE($5, patient_reference), \
                notes = COALESCE($6, notes) \
             WHERE id = $1 AND deleted_at IS NULL AND is_draft = true AND status = 'draft' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .bind(&input.procedure_category)
            .bind(&input.guide_type)
            .bind(&input.required_service)
            .bind(&input.patient_reference)
            .bind(&input.notes)
            .fetch_optional(executor)
            .await
    }

    /// Soft-delete a draft. Returns `false` if nothing matched.
    pub async fn soft_delete_draft(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cases SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL AND is_draft = true AND status = 'draft'",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist a new status. Entering `delivered` stamps `delivered_at`.
    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: CaseStatus,
    ) -> Result<Case, sqlx::Error> {
        let query = format!(
            "UPDATE cases SET \
                status = $2, \
                delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(executor)
            .await
    }

    /// Move a case out of draft: clears `is_draft`, stamps `submitted_at`
    /// once, and persists `status`.
    pub async fn mark_submitted(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: CaseStatus,
    ) -> Result<Case, sqlx::Error> {
        let query = format!(
            "UPDATE cases SET \
                status = $2, \
                is_draft = false, \
                submitted_at = COALESCE(submitted_at, NOW()) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Case>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(executor)
            .await
    }
}
