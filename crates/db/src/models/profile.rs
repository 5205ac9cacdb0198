//! Client and designer profiles, provisioned by the identity service.

use serde::Serialize;
use sqlx::FromRow;
use surgiguide_core::types::{DbId, Timestamp};

/// A row from the `client_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub display_name: String,
    pub email: Option<String>,
    pub preferred_language: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `designer_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignerProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub display_name: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub preferred_language: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Who to notify: a user id plus how to reach and address them.
#[derive(Debug, Clone, FromRow)]
pub struct Recipient {
    pub user_id: DbId,
    pub email: Option<String>,
    pub preferred_language: String,
}
