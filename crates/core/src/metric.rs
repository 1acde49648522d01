//! Tracked metric identifiers and the live reading snapshot.
//!
//! The key strings double as the upstream database paths and as the JSON
//! keys of the `/latest-iot-data` payload and the alert `reference_values`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Heart rate in beats per minute.
pub const METRIC_BPM: &str = "BPM";

/// Body temperature in degrees Celsius.
pub const METRIC_DEGREE_C: &str = "DegreeC";

/// Blood oxygen saturation percentage.
pub const METRIC_SPO2: &str = "Spo2";

/// One tracked physiological reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "BPM")]
    Bpm,
    #[serde(rename = "DegreeC")]
    DegreeC,
    #[serde(rename = "Spo2")]
    Spo2,
}

impl Metric {
    /// Every tracked metric, in polling order.
    pub const ALL: [Metric; 3] = [Metric::Bpm, Metric::DegreeC, Metric::Spo2];

    /// Canonical key used upstream and in serialized payloads.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Bpm => METRIC_BPM,
            Metric::DegreeC => METRIC_DEGREE_C,
            Metric::Spo2 => METRIC_SPO2,
        }
    }

    /// Upper-case form used in environment variable names
    /// (`THRESHOLD_BPM_MIN`, `THRESHOLD_DEGREEC_MAX`, ...).
    pub fn env_key(self) -> String {
        self.key().to_ascii_uppercase()
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Metric::Bpm => 0,
            Metric::DegreeC => 1,
            Metric::Spo2 => 2,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Latest known value per metric. `None` means no reading has been seen.
///
/// Always holds an entry for every [`Metric`], so it serializes as a flat
/// object with `null` for missing readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: BTreeMap<Metric, Option<f64>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            values: Metric::ALL.into_iter().map(|m| (m, None)).collect(),
        }
    }
}

impl Snapshot {
    /// An empty snapshot: every metric present, none with a value.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied().flatten()
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values.insert(metric, value);
    }

    /// Iterate `(metric, value)` pairs in polling order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }
}

impl FromIterator<(Metric, Option<f64>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Metric, Option<f64>)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::default();
        for (metric, value) in iter {
            snapshot.set(metric, value);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_serializes_every_metric_as_null() {
        let json = serde_json::to_value(Snapshot::new()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "BPM": null, "DegreeC": null, "Spo2": null })
        );
    }

    #[test]
    fn partial_snapshot_keeps_missing_metrics() {
        let snapshot: Snapshot = [(Metric::Bpm, Some(72.0))].into_iter().collect();
        assert_eq!(snapshot.get(Metric::Bpm), Some(72.0));
        assert_eq!(snapshot.get(Metric::Spo2), None);
        assert_eq!(snapshot.iter().count(), 3);
    }

    #[test]
    fn iteration_follows_polling_order() {
        let keys: Vec<Metric> = Snapshot::new().iter().map(|(m, _)| m).collect();
        assert_eq!(keys, Metric::ALL.to_vec());
    }

    #[test]
    fn env_key_is_upper_case() {
        assert_eq!(Metric::DegreeC.env_key(), "DEGREEC");
        assert_eq!(Metric::Spo2.env_key(), "SPO2");
    }
}
