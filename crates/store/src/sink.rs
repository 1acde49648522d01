use async_trait::async_trait;
use vitals_core::Alert;

use crate::error::StoreError;

/// Append-only store of alert records.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Persist one alert and return the id the store assigned to it.
    async fn add(&self, alert: &Alert) -> Result<String, StoreError>;
}
