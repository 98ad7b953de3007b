//! CPU burner kernel.
//!
//! The accumulation loop is exposed in chunks so an async caller can yield to
//! its scheduler between them without this crate knowing about the runtime.

use sha2::{Digest, Sha256};

/// Iterations between voluntary yields.
pub const YIELD_EVERY: u64 = 100_000;

/// Chunked arithmetic accumulation over `0..total`.
#[derive(Debug, Clone)]
pub struct CpuBurn {
    total: u64,
    next: u64,
    acc: u64,
}

impl CpuBurn {
    pub fn new(total: u64) -> Self {
        Self { total, next: 0, acc: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.total
    }

    /// Run at most `budget` iterations. Returns `true` once the loop is exhausted.
    pub fn advance(&mut self, budget: u64) -> bool {
        let end = self.next.saturating_add(budget).min(self.total);
        for i in self.next..end {
            self.acc = self.acc.wrapping_add(i.wrapping_mul(i));
        }
        self.next = end;
        self.is_done()
    }

    /// Accumulated value so far (wrapping on overflow).
    pub fn accumulator(&self) -> u64 {
        self.acc
    }

    /// Lowercase hex SHA-256 of the accumulator's decimal form.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.acc.to_string().as_bytes()))
    }

    /// Drive the whole loop without yielding and return the digest.
    pub fn run_to_end(mut self) -> String {
        while !self.advance(YIELD_EVERY) {}
        self.digest()
    }
}
