//! HTTP handlers.
//!
//! - `ops`   : `/`, `/health`, `/metrics`
//! - `load`  : CPU, memory, delay and chaos generators
//! - `stats` : on-demand catalog refresh

pub mod load;
pub mod ops;
pub mod stats;
