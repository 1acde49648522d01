//! Background tasks.
//!
//! Each submodule provides a long-running async task intended to be spawned
//! once at startup. All tasks accept a [`CancellationToken`] for graceful
//! shutdown.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod vitals_monitor;

pub use vitals_monitor::{join_monitor, CycleReport, MonitorExit, VitalsMonitor};
