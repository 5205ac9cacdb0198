//! The notification envelope handed to delivery channels.

use serde::Serialize;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::types::DbId;

/// One notification for one user.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    pub user_id: DbId,
    pub purpose: NotificationPurpose,
    pub title: String,
    pub body: String,
    pub action_url: Option<String>,
    pub metadata: serde_json::Value,
    pub language: String,
}
