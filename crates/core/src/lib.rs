//! Domain types and pure decision logic for the vitals monitor.
//!
//! Nothing in this crate performs I/O. The sampler in `vitals-api` fetches
//! readings through `vitals-store`, and hands the resulting [`Snapshot`] to
//! [`thresholds::evaluate`].

pub mod alert;
pub mod error;
pub mod metric;
pub mod thresholds;

pub use alert::Alert;
pub use error::CoreError;
pub use metric::{Metric, Snapshot};
pub use thresholds::{
    evaluate, evaluate_readings, EvaluateError, Evaluation, ThresholdRange, ThresholdTable,
};
