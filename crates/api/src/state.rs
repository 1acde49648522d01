use std::sync::Arc;

use crate::config::ServerConfig;
use crate::snapshot::SnapshotStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Live snapshot written by the vitals monitor.
    pub snapshot: Arc<SnapshotStore>,
}
