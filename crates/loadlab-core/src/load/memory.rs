//! Memory commit kernel.

use rand::RngCore;

/// Size of one buffer.
pub const MIB: usize = 1024 * 1024;

/// Allocate `size_mb` independent 1 MiB buffers, fill each with random bytes
/// so the pages are actually committed, then read the first byte of every
/// buffer back. Returns the sum of those bytes; the buffers are dropped on
/// return.
pub fn commit_buffers<R: RngCore>(size_mb: usize, rng: &mut R) -> u64 {
    let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(size_mb);
    for _ in 0..size_mb {
        let mut block = vec![0u8; MIB];
        rng.fill_bytes(&mut block);
        blocks.push(block);
    }
    blocks
        .iter()
        .map(|b| u64::from(std::hint::black_box(b.first().copied().unwrap_or(0))))
        .sum()
}
