//! Synthetic load kernels.
//!
//! Each generator has a parameter rule in [`params`] (invalid input is never
//! rejected, it falls back to a documented default) and a bounded kernel.

pub mod cpu;
pub mod memory;
pub mod params;

pub use cpu::CpuBurn;
pub use memory::commit_buffers;
pub use params::{delay_seconds, error_rate, iterations, size_mb};
