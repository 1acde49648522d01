//! Threshold evaluation engine for vital-sign readings.
//!
//! Pure logic with no store access. The caller is responsible for fetching the
//! snapshot and forwarding the resulting alerts.
//!
//! No cooldown: a metric that stays out of range produces one alert per
//! evaluation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::alert::Alert;
use crate::error::CoreError;
use crate::metric::{Metric, Snapshot};

/// Default safe range for heart rate (BPM).
pub const DEFAULT_BPM_RANGE: (f64, f64) = (95.0, 100.0);

/// Default safe range for body temperature (°C).
pub const DEFAULT_DEGREE_C_RANGE: (f64, f64) = (38.5, 39.5);

/// Default safe range for blood oxygen saturation (%).
pub const DEFAULT_SPO2_RANGE: (f64, f64) = (48.0, 84.0);

/// Inclusive safe range `[min, max]` for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdRange {
    min: f64,
    max: f64,
}

impl ThresholdRange {
    /// Build a range, rejecting non-finite bounds and `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(CoreError::Validation(format!(
                "threshold bounds must be finite, got ({min}, {max})"
            )));
        }
        if min > max {
            return Err(CoreError::Validation(format!(
                "threshold min {min} is greater than max {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `true` when `value` lies within `[min, max]` (bounds included).
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One [`ThresholdRange`] for every tracked [`Metric`].
///
/// Complete by construction, so evaluation never hits a missing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    ranges: [ThresholdRange; 3],
}

impl ThresholdTable {
    pub fn new(bpm: ThresholdRange, degree_c: ThresholdRange, spo2: ThresholdRange) -> Self {
        Self {
            ranges: [bpm, degree_c, spo2],
        }
    }

    pub fn get(&self, metric: Metric) -> &ThresholdRange {
        &self.ranges[metric.index()]
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let range = |(min, max): (f64, f64)| ThresholdRange { min, max };
        Self::new(
            range(DEFAULT_BPM_RANGE),
            range(DEFAULT_DEGREE_C_RANGE),
            range(DEFAULT_SPO2_RANGE),
        )
    }
}

/// Errors that end an evaluation early.
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("{metric} reading {value} is not a finite number")]
    NonFinite { metric: Metric, value: f64 },
}

/// Outcome of one evaluation pass.
///
/// `alerts` holds everything built before `error` (if any) stopped the pass;
/// those alerts are still meant to be forwarded.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub alerts: Vec<Alert>,
    pub error: Option<EvaluateError>,
}

/// Evaluate a snapshot against the threshold table.
///
/// Every alert in the result carries the same `date` and a copy of the full
/// `snapshot`. Metrics without a reading are skipped.
pub fn evaluate(snapshot: &Snapshot, thresholds: &ThresholdTable, date: NaiveDate) -> Evaluation {
    evaluate_readings(snapshot, snapshot, thresholds, date)
}

/// Evaluate `readings`, embedding `reference` in every alert.
///
/// The sampler passes this cycle's fresh readings (failed fetches cleared)
/// as `readings` and the live snapshot as `reference`, so a value that could
/// not be re-read is reported but never re-alerted.
pub fn evaluate_readings(
    readings: &Snapshot,
    reference: &Snapshot,
    thresholds: &ThresholdTable,
    date: NaiveDate,
) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for (metric, value) in readings.iter() {
        let Some(value) = value else {
            continue;
        };

        match check_threshold(metric, value, thresholds.get(metric), date, reference) {
            Ok(Some(alert)) => evaluation.alerts.push(alert),
            Ok(None) => {}
            Err(e) => {
                evaluation.error = Some(e);
                break;
            }
        }
    }

    evaluation
}

/// Compare a single reading against its range and build an alert if violated.
fn check_threshold(
    metric: Metric,
    value: f64,
    range: &ThresholdRange,
    date: NaiveDate,
    snapshot: &Snapshot,
) -> Result<Option<Alert>, EvaluateError> {
    if !value.is_finite() {
        return Err(EvaluateError::NonFinite { metric, value });
    }

    if range.contains(value) {
        return Ok(None);
    }

    Ok(Some(Alert::out_of_range(
        metric,
        value,
        range,
        date,
        snapshot.clone(),
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
