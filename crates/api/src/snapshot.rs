//! The process-wide live snapshot.
//!
//! Written one metric at a time by the vitals monitor and read by the
//! `/latest-iot-data` handler. The write lock is held only while a single
//! value is replaced, never across a fetch, so readers may see a
//! partially-updated cycle but never wait on network I/O.

use tokio::sync::RwLock;
use vitals_core::{Metric, Snapshot};

#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<Snapshot>,
}

impl SnapshotStore {
    /// Create a store where every metric is still absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current snapshot.
    pub async fn read(&self) -> Snapshot {
        self.inner.read().await.clone()
    }

    /// Replace the value of a single metric.
    pub async fn set(&self, metric: Metric, value: Option<f64>) {
        self.inner.write().await.set(metric, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let store = SnapshotStore::new();
        assert_eq!(store.read().await, Snapshot::new());
    }

    #[tokio::test]
    async fn set_replaces_only_one_metric() {
        let store = SnapshotStore::new();
        store.set(Metric::Bpm, Some(80.0)).await;
        store.set(Metric::Spo2, Some(97.0)).await;
        store.set(Metric::Bpm, None).await;

        let snapshot = store.read().await;
        assert_eq!(snapshot.get(Metric::Bpm), None);
        assert_eq!(snapshot.get(Metric::Spo2), Some(97.0));
    }
}
