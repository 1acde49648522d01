//! Vitals monitor server library.
//!
//! Exposes the building blocks (config, state, snapshot store, routes,
//! background monitor) so integration tests and the binary entrypoint can
//! both access them.

pub mod background;
pub mod config;
pub mod router;
pub mod routes;
pub mod snapshot;
pub mod state;
