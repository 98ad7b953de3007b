//! In-process metrics.
//!
//! `registry` holds the generic counter/gauge/histogram families and renders
//! the `/metrics` text; `metrics` declares the families this service writes;
//! `instrument` is the per-request middleware feeding them.

pub mod instrument;
pub mod metrics;
pub mod registry;

pub use metrics::ServiceMetrics;
pub use registry::Registry;
