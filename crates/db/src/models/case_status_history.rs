//! Case status history models.

use serde::Serialize;
use sqlx::FromRow;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::roles::Actor;
use surgiguide_core::types::{DbId, Timestamp};

/// A row from the append-only `case_status_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CaseStatusHistory {
    pub id: DbId,
    pub case_id: DbId,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor_kind: String,
    pub actor_id: DbId,
    pub note: Option<String>,
    pub is_override: bool,
    pub created_at: Timestamp,
}

/// A history entry about to be appended.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub case_id: DbId,
    /// `None` for creation of a draft.
    pub from_status: Option<CaseStatus>,
    pub to_status: CaseStatus,
    pub actor: Actor,
    pub note: Option<String>,
    pub is_override: bool,
}
