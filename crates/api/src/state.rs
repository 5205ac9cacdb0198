use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: surgiguide_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Workflow operations publish here after their transaction commits.
    pub event_bus: Arc<surgiguide_events::EventBus>,
}
