//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`PlatformEvent`]s. Workflow
//! operations publish after their transaction commits; the notification
//! router subscribes and turns events into inbox rows and emails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surgiguide_core::case_status::CaseStatus;
use surgiguide_core::notification::NotificationPurpose;
use surgiguide_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Audience
// ---------------------------------------------------------------------------

/// Who should hear about an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Audience {
    /// The client owning the case.
    Client { client_profile_id: DbId },
    /// Staff. With `admins_only`, plain designers are skipped.
    Staff { admins_only: bool },
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// Something that happened to a case.
///
/// Constructed via [`PlatformEvent::new`], which fixes the audience, and
/// enriched with [`with_actor`](PlatformEvent::with_actor) and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub purpose: NotificationPurpose,

    pub case_id: DbId,

    /// Human-readable case number, e.g. `SG-2026-000042`.
    pub case_number: String,

    /// Case status after the change.
    pub status: CaseStatus,

    pub audience: Audience,

    /// User id of whoever caused the event.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data, copied into the notification metadata.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(
        purpose: NotificationPurpose,
        case_id: DbId,
        case_number: impl Into<String>,
        status: CaseStatus,
        audience: Audience,
    ) -> Self {
        Self {
            purpose,
            case_id,
            case_number: case_number.into(),
            status,
            audience,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use surgiguide_core::case_status::CaseStatus;
/// use surgiguide_core::notification::NotificationPurpose;
/// use surgiguide_events::bus::{Audience, EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(
///     NotificationPurpose::QuoteSent,
///     1,
///     "SG-2026-000001",
///     CaseStatus::QuoteSent,
///     Audience::Client { client_profile_id: 3 },
/// ));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Never blocks or fails.
    pub fn publish(&self, event: PlatformEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
