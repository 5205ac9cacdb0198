//! Repository for the append-only `case_status_history` table.

use sqlx::PgExecutor;
use surgiguide_core::types::DbId;

use crate::models::case_status_history::{CaseStatusHistory, NewHistoryEntry};

const COLUMNS: &str =
    "id, case_id, from_status, to_status, actor_kind, actor_id, note, is_override, created_at";

/// Appends and reads status history. Rows are never updated or deleted.
pub struct CaseHistoryRepo;

impl CaseHistoryRepo {
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        entry: &NewHistoryEntry,
    ) -> Result<CaseStatusHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO case_status_history \
                (case_id, from_status, to_status, actor_kind, actor_id, note, is_override) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CaseStatusHistory>(&query)
            .bind(entry.case_id)
            .bind(entry.from_status.map(|s| s.as_str()))
            .bind(entry.to_status.as_str())
            .bind(entry.actor.kind.as_str())
            .bind(entry.actor.id)
            .bind(&entry.note)
            .bind(entry.is_override)
            .fetch_one(executor)
            .await
    }

    /// History of a case in the order it happened.
    pub async fn list_for_case(
        executor: impl PgExecutor<'_>,
        case_id: DbId,
    ) -> Result<Vec<CaseStatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM case_status_history \
             WHERE case_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, CaseStatusHistory>(&query)
            .bind(case_id)
            .fetch_all(executor)
            .await
    }
}
