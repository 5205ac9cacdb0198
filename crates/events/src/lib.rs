//! SurgiGuide event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: what happened to a case and who should hear about it.
//! - [`NotificationRequest`]: one rendered notification for one user.
//! - [`delivery`]: external delivery channels (email).

pub mod bus;
pub mod delivery;
pub mod notification;

pub use bus::{Audience, EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notification::NotificationRequest;
