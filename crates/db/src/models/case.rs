//! Case entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::error::CoreError;
use surgiguide_core::types::{DbId, Timestamp};

/// A row from the `cases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Case {
    pub id: DbId,
    pub client_profile_id: DbId,
    pub case_number: String,
    pub status: String,
    pub is_draft: bool,
    pub procedure_category: Option<String>,
    pub guide_type: Option<String>,
    pub required_service: Option<String>,
    pub patient_reference: Option<String>,
    pub notes: Option<String>,
    pub submitted_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Case {
    /// Parse the stored status string.
    pub fn case_status(&self) -> Result<CaseStatus, CoreError> {
        self.status.parse()
    }
}

/// DTO for creating a draft case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCase {
    pub procedure_category: Option<String>,
    pub guide_type: Option<String>,
    pub required_service: Option<String>,
    pub patient_reference: Option<String>,
    pub notes: Option<String>,
}

/// DTO for editing a draft. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCase {
    pub procedure_category: Option<String>,
    pub guide_type: Option<String>,
    pub required_service: Option<String>,
    pub patient_reference: Option<String>,
    pub notes: Option<String>,
}

/// Filters for case listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseListFilter {
    pub client_profile_id: Option<DbId>,
    pub status: Option<String>,
    /// Staff listings hide drafts that were never submitted.
    #[serde(default)]
    pub exclude_drafts: bool,
}
