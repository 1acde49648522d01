//! Upstream reading source and downstream alert sink.
//!
//! - [`MetricSource`]: read-only access to the latest value per metric.
//! - [`AlertSink`]: append-only alert store.
//! - [`firebase`]: Firebase Realtime Database REST implementation of both.
//! - [`memory`]: in-process implementation with injectable failures.

pub mod error;
pub mod firebase;
pub mod memory;
pub mod sink;
pub mod source;

pub use error::StoreError;
pub use firebase::{AlertCollection, RealtimeDatabase};
pub use memory::{MemorySink, MemorySource};
pub use sink::AlertSink;
pub use source::MetricSource;
