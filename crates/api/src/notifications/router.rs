//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] consumes [`PlatformEvent`]s published after
//! workflow commits. Failures here are logged and never reach the request
//! that caused the event.

use std::sync::Arc;

use surgiguide_core::notification::{case_action_path, render};
use surgiguide_core::types::DbId;
use surgiguide_db::models::notification::NewNotification;
use surgiguide_db::models::profile::Recipient;
use surgiguide_db::repositories::{NotificationRepo, ProfileRepo};
use surgiguide_db::DbPool;
use surgiguide_events::{Audience, EmailDelivery, NotificationRequest, PlatformEvent};
use tokio::sync::broadcast;

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
    email: Option<Arc<EmailDelivery>>,
    public_app_url: String,
}

impl NotificationRouter {
    /// Create a router. Without `email`, notifications are stored in the
    /// inbox only.
    pub fn new(pool: DbPool, email: Option<EmailDelivery>, public_app_url: impl Into<String>) -> Self {
        Self {
            pool,
            email: email.map(Arc::new),
            public_app_url: public_app_url.into(),
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](surgiguide_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            purpose = %event.purpose,
                            case_id = event.case_id,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event to every recipient in its audience except the
    /// actor. Returns the number of notifications stored; a recipient whose
    /// insert fails is logged and skipped.
    pub async fn route_event(&self, event: &PlatformEvent) -> Result<usize, sqlx::Error> {
        let recipients = self.determine_targets(event).await?;
        let message = render(event.purpose, &event.case_number, event.status);
        let action_url = format!("{}{}", self.public_app_url, case_action_path(event.case_id));

        let mut delivered = 0;
        for recipient in recipients {
            if event.actor_user_id == Some(recipient.user_id) {
                continue;
            }
            let request = NotificationRequest {
                user_id: recipient.user_id,
                purpose: event.purpose,
                title: message.title.clone(),
                body: message.body.clone(),
                action_url: Some(action_url.clone()),
                metadata: serde_json::json!({
                    "case_id": event.case_id,
                    "case_number": event.case_number,
                    "status": event.status,
                    "details": event.payload,
                }),
                language: recipient.preferred_language.clone(),
            };
            match self.notify(&request, recipient.email.as_deref()).await {
                Ok(_) => delivered += 1,
                Err(e) => tracing::error!(
                    error = %e,
                    user_id = recipient.user_id,
                    purpose = %event.purpose,
                    case_id = event.case_id,
                    "Failed to store notification"
                ),
            }
        }
        Ok(delivered)
    }

    /// Store a notification in the recipient's inbox and, when configured,
    /// send it by email in the background.
    pub async fn notify(
        &self,
        request: &NotificationRequest,
        email_address: Option<&str>,
    ) -> Result<DbId, sqlx::Error> {
        let id = NotificationRepo::create(
            &self.pool,
            &NewNotification {
                user_id: request.user_id,
                purpose: request.purpose.as_str().to_string(),
                title: request.title.clone(),
                body: request.body.clone(),
                action_url: request.action_url.clone(),
                metadata: request.metadata.clone(),
                language: request.language.clone(),
            },
        )
        .await?;

        if let (Some(delivery), Some(to)) = (&self.email, email_address) {
            let delivery = Arc::clone(delivery);
            let to = to.to_string();
            let request = request.clone();
            tokio::spawn(async move {
                if let Err(e) = delivery.deliver(&to, &request).await {
                    tracing::error!(
                        error = %e,
                        user_id = request.user_id,
                        purpose = %request.purpose,
                        "Failed to send notification email"
                    );
                }
            });
        }

        Ok(id)
    }

    /// Resolve the audience of an event to concrete recipients.
    async fn determine_targets(&self, event: &PlatformEvent) -> Result<Vec<Recipient>, sqlx::Error> {
        match event.audience {
            Audience::Client { client_profile_id } => {
                let recipient = ProfileRepo::client_recipient(&self.pool, client_profile_id).await?;
                if recipient.is_none() {
                    tracing::warn!(client_profile_id, "Client profile not found, skipping notification");
                }
                Ok(recipient.into_iter().collect())
            }
            Audience::Staff { admins_only } => {
                ProfileRepo::staff_recipients(&self.pool, admins_only).await
            }
        }
    }
}
