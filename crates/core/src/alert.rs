//! Out-of-range alert records.

use chrono::NaiveDate;
use serde::Serialize;

use crate::metric::{Metric, Snapshot};
use crate::thresholds::ThresholdRange;

/// Sender recorded on every alert produced by the monitor.
pub const ALERT_SOURCE: &str = "System";

/// A single out-of-range observation, destined for the alert store.
///
/// Field names on the wire follow the existing `new_notifications` document
/// shape (`user`, `sender`, `reference_values`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Always `None` for system alerts.
    #[serde(rename = "user")]
    pub recipient: Option<String>,
    #[serde(rename = "sender")]
    pub source: String,
    pub title: String,
    pub message: String,
    /// Evaluation date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Full snapshot at evaluation time, not just the offending metric.
    #[serde(rename = "reference_values")]
    pub snapshot: Snapshot,
}

impl Alert {
    /// Build the alert for `metric` reading `value` outside `range`.
    pub fn out_of_range(
        metric: Metric,
        value: f64,
        range: &ThresholdRange,
        date: NaiveDate,
        snapshot: Snapshot,
    ) -> Self {
        let title = format!("{metric} Alert!");
        let message = format!(
            "{title} {metric} value {value} is out of range ({}-{}).",
            range.min(),
            range.max()
        );

        Self {
            recipient: None,
            source: ALERT_SOURCE.to_string(),
            title,
            message,
            date,
            snapshot,
        }
    }
}
