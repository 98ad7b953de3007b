//! loadlab core: runtime-free load kernels, parameter rules, and error types.
//!
//! The server crate owns HTTP, metrics and the catalog store; this crate only
//! knows how to turn raw query values into bounded work and how to perform
//! that work. It carries no async runtime so the kernels can be driven from
//! any executor (the server yields between CPU chunks).
//!
//! Panics, `unwrap`, and `expect` are compile-denied here.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod load;

/// Shared result type.
pub use error::{LoadLabError, Result};
