//! Notification routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus, resolves who
//! should hear about each event, stores an inbox row per recipient and hands
//! the message to email delivery when SMTP is configured.

pub mod router;

pub use router::NotificationRouter;
