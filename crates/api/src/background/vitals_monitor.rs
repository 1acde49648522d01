//! Vital-sign polling and threshold alerting.
//!
//! Each cycle fetches every tracked metric from the [`MetricSource`], writes
//! the results into the shared [`SnapshotStore`], evaluates the readings
//! fetched this cycle against the threshold table, and forwards every
//! resulting alert to the
//! [`AlertSink`] (and the optional [`Notifier`]). A metric whose fetch failed
//! keeps its previous value in the snapshot but is absent for evaluation.
//! The loop then sleeps for
//! the poll interval, so the cadence is measured from the end of one cycle to
//! the start of the next.
//!
//! Nothing inside a cycle stops the loop: fetch, evaluation, persistence and
//! notification failures are logged and the next cycle runs as scheduled.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitals_core::{evaluate_readings, Alert, Metric, Snapshot, ThresholdTable};
use vitals_events::Notifier;
use vitals_store::{AlertSink, MetricSource};

use crate::snapshot::SnapshotStore;

/// Default pause between cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound on a single metric fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Counters describing one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Metrics whose fetch failed or timed out (left unchanged, not evaluated).
    pub fetch_failures: usize,
    /// Alerts produced by the evaluator.
    pub alerts: usize,
    /// Alerts the sink accepted.
    pub persisted: usize,
    /// Alerts the sink rejected.
    pub persist_failures: usize,
    /// Notifications that failed to send.
    pub notify_failures: usize,
    /// Whether evaluation stopped early on an error.
    pub evaluation_failed: bool,
}

/// How a monitor task ended during shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    Stopped,
    /// The task panicked or was aborted.
    Failed(String),
    TimedOut,
}

/// Wait up to `timeout` for a cancelled monitor task to finish, logging the
/// outcome.
pub async fn join_monitor(handle: JoinHandle<()>, timeout: Duration) -> MonitorExit {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => {
            tracing::info!("Vitals monitor stopped");
            MonitorExit::Stopped
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Vitals monitor task failed");
            MonitorExit::Failed(e.to_string())
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Vitals monitor did not stop within the shutdown timeout"
            );
            MonitorExit::TimedOut
        }
    }
}

/// The polling loop driver.
///
/// [`spawn`](Self::spawn) consumes the monitor, so one value drives at most
/// one background task.
pub struct VitalsMonitor {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn AlertSink>,
    notifier: Option<Arc<dyn Notifier>>,
    snapshot: Arc<SnapshotStore>,
    thresholds: ThresholdTable,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl VitalsMonitor {
    pub fn new(
        source: Arc<dyn MetricSource>,
        sink: Arc<dyn AlertSink>,
        snapshot: Arc<SnapshotStore>,
        thresholds: ThresholdTable,
    ) -> Self {
        Self {
            source,
            sink,
            notifier: None,
            snapshot,
            thresholds,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Also push every alert through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Spawn the loop on the tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run cycles until `cancel` is triggered.
    ///
    /// Cancellation is observed while fetching and while sleeping. A cycle
    /// that has finished sampling always completes its forwarding.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            fetch_timeout_secs = self.fetch_timeout.as_secs(),
            notifier = self.notifier.as_ref().map(|n| n.channel()),
            "Vitals monitor started"
        );

        loop {
            let (snapshot, failed) = tokio::select! {
                _ = cancel.cancelled() => break,
                sampled = self.sample() => sampled,
            };

            let report = self.process(&snapshot, &failed).await;
            tracing::debug!(?report, "Vitals cycle complete");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Vitals monitor stopping");
    }

    /// Run one fetch → evaluate → forward cycle without sleeping.
    pub async fn run_cycle(&self) -> CycleReport {
        let (snapshot, failed) = self.sample().await;
        self.process(&snapshot, &failed).await
    }

    /// Fetch every metric and write successful results into the live
    /// snapshot. Returns the snapshot as it stands afterwards and the metrics
    /// whose fetch failed.
    async fn sample(&self) -> (Snapshot, Vec<Metric>) {
        let mut failed = Vec::new();

        for metric in Metric::ALL {
            match self.fetch(metric).await {
                Some(value) => self.snapshot.set(metric, value).await,
                None => failed.push(metric),
            }
        }

        let snapshot = self.snapshot.read().await;
        tracing::info!(?snapshot, fetch_failures = failed.len(), "Sampled vital signs");
        (snapshot, failed)
    }

    /// Fetch one metric, bounded by the fetch timeout.
    ///
    /// `None` means the fetch failed and the metric keeps its previous value.
    async fn fetch(&self, metric: Metric) -> Option<Option<f64>> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(metric)).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(metric = %metric, error = %e, "Failed to fetch reading");
                None
            }
            Err(_) => {
                tracing::warn!(
                    metric = %metric,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Fetching reading timed out"
                );
                None
            }
        }
    }

    /// Evaluate the fresh readings in `snapshot` and forward the resulting
    /// alerts. Metrics in `failed` are skipped; alerts still embed the whole
    /// snapshot.
    async fn process(&self, snapshot: &Snapshot, failed: &[Metric]) -> CycleReport {
        let mut readings = snapshot.clone();
        for &metric in failed {
            readings.set(metric, None);
        }

        let today = Local::now().date_naive();
        let evaluation = evaluate_readings(&readings, snapshot, &self.thresholds, today);

        let mut report = CycleReport {
            fetch_failures: failed.len(),
            alerts: evaluation.alerts.len(),
            evaluation_failed: evaluation.error.is_some(),
            ..CycleReport::default()
        };

        if let Some(e) = &evaluation.error {
            tracing::error!(
                error = %e,
                queued = evaluation.alerts.len(),
                "Threshold evaluation stopped early"
            );
        }

        for alert in &evaluation.alerts {
            self.forward(alert, &mut report).await;
        }

        report
    }

    /// Persist one alert, then notify. Neither step is retried and neither
    /// failure affects the other.
    async fn forward(&self, alert: &Alert, report: &mut CycleReport) {
        match self.sink.add(alert).await {
            Ok(id) => {
                report.persisted += 1;
                tracing::info!(id = %id, title = %alert.title, "Alert saved");
            }
            Err(e) => {
                report.persist_failures += 1;
                tracing::error!(title = %alert.title, error = %e, "Failed to save alert");
            }
        }

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(alert).await {
                report.notify_failures += 1;
                tracing::warn!(
                    channel = notifier.channel(),
                    title = %alert.title,
                    error = %e,
                    "Failed to send alert notification"
                );
            }
        }
    }
}
