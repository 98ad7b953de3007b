//! loadlab server library entry.
//!
//! Wires the metric registry, instrumentation middleware, load handlers,
//! catalog store and background sampler into one HTTP service. Consumed by
//! the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod obs;
pub mod router;
pub mod sampler;
pub mod store;
