//! Notification inbox model.

use serde::Serialize;
use sqlx::FromRow;
use surgiguide_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub purpose: String,
    pub title: String,
    pub body: String,
    pub action_url: Option<String>,
    pub metadata: serde_json::Value,
    pub language: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A notification about to be stored.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub purpose: String,
    pub title: String,
    pub body: String,
    pub action_url: Option<String>,
    pub metadata: serde_json::Value,
    pub language: String,
}
