//! In-process metric source and alert sink.
//!
//! Used for local runs without Firebase (`STORE_BACKEND=memory`) and by the
//! monitor tests. Failures can be injected per metric and per write attempt.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vitals_core::{Alert, Metric};

use crate::error::StoreError;
use crate::sink::AlertSink;
use crate::source::MetricSource;

/// What the source answers for one metric.
#[derive(Debug, Clone)]
enum Entry {
    Reading(Option<f64>),
    Failure(String),
}

/// Metric source backed by an in-memory map.
///
/// Metrics that were never set read as `None`.
#[derive(Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<Metric, Entry>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value returned for `metric`, clearing any injected failure.
    pub async fn set_reading(&self, metric: Metric, value: Option<f64>) {
        self.entries
            .write()
            .await
            .insert(metric, Entry::Reading(value));
    }

    /// Make every fetch of `metric` fail until a reading is set again.
    pub async fn fail(&self, metric: Metric, reason: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(metric, Entry::Failure(reason.into()));
    }

    /// Total fetches served, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for MemorySource {
    async fn fetch(&self, metric: Metric) -> Result<Option<f64>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.entries.read().await.get(&metric) {
            Some(Entry::Reading(value)) => Ok(*value),
            Some(Entry::Failure(reason)) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(None),
        }
    }
}

/// Alert sink that keeps every accepted alert in memory.
#[derive(Default)]
pub struct MemorySink {
    alerts: RwLock<Vec<(String, Alert)>>,
    failing_attempts: RwLock<HashSet<usize>>,
    attempts: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `attempt`-th call to [`AlertSink::add`] (0-based, counted
    /// over the sink's lifetime).
    pub async fn fail_attempt(&self, attempt: usize) {
        self.failing_attempts.write().await.insert(attempt);
    }

    /// Alerts accepted so far, in write order.
    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .read()
            .await
            .iter()
            .map(|(_, alert)| alert.clone())
            .collect()
    }

    /// Ids assigned to accepted alerts, in write order.
    pub async fn ids(&self) -> Vec<String> {
        self.alerts
            .read()
            .await
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Total write attempts, accepted or rejected.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for MemorySink {
    async fn add(&self, alert: &Alert) -> Result<String, StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_attempts.read().await.contains(&attempt) {
            return Err(StoreError::Unavailable(format!(
                "write attempt {attempt} rejected"
            )));
        }

        let id = uuid::Uuid::now_v7().to_string();
        self.alerts.write().await.push((id.clone(), alert.clone()));
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use vitals_core::{Snapshot, ThresholdRange};

    use super::*;

    fn alert() -> Alert {
        Alert::out_of_range(
            Metric::Bpm,
            130.0,
            &ThresholdRange::new(95.0, 100.0).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            Snapshot::new(),
        )
    }

    #[tokio::test]
    async fn unset_metric_reads_as_absent() {
        let source = MemorySource::new();
        assert_eq!(source.fetch(Metric::Spo2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failure_is_cleared_by_next_reading() {
        let source = MemorySource::new();
        source.fail(Metric::Bpm, "connection reset").await;
        assert_matches!(
            source.fetch(Metric::Bpm).await,
            Err(StoreError::Unavailable(_))
        );

        source.set_reading(Metric::Bpm, Some(88.0)).await;
        assert_eq!(source.fetch(Metric::Bpm).await.unwrap(), Some(88.0));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn sink_assigns_unique_ids() {
        let sink = MemorySink::new();
        let first = sink.add(&alert()).await.unwrap();
        let second = sink.add(&alert()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(sink.ids().await, vec![first, second]);
        assert_eq!(sink.alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn rejected_attempt_is_counted_but_not_stored() {
        let sink = MemorySink::new();
        sink.fail_attempt(0).await;

        assert!(sink.add(&alert()).await.is_err());
        assert!(sink.add(&alert()).await.is_ok());
        assert_eq!(sink.attempts(), 2);
        assert_eq!(sink.alerts().await.len(), 1);
    }
}
