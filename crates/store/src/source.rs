use async_trait::async_trait;
use vitals_core::Metric;

use crate::error::StoreError;

/// Read-only key-value store holding the latest reading per metric.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch the current value for `metric`.
    ///
    /// `Ok(None)` means the key exists in the store's namespace but holds no
    /// reading yet.
    async fn fetch(&self, metric: Metric) -> Result<Option<f64>, StoreError>;
}
