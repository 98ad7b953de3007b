//! Query parameter rules for the load generators.
//!
//! All inputs arrive as optional raw strings. Anything absent, unparsable, or
//! out of range resolves to the default; there is no rejection path.

/// Default CPU burner iteration count.
pub const DEFAULT_ITERATIONS: u64 = 1_000_000;
/// Default memory allocation in MiB.
pub const DEFAULT_SIZE_MB: usize = 10;
/// Accepted memory allocation range in MiB.
pub const SIZE_MB_RANGE: std::ops::RangeInclusive<i64> = 1..=100;
/// Default simulated delay in seconds.
pub const DEFAULT_DELAY_SECONDS: f64 = 1.0;
/// Accepted delay range in seconds.
pub const DELAY_SECONDS_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;
/// Default failure probability for the chaos endpoint.
pub const DEFAULT_ERROR_RATE: f64 = 0.2;

/// Iteration count: any positive integer, otherwise the default.
pub fn iterations(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as u64)
        .unwrap_or(DEFAULT_ITERATIONS)
}

/// Allocation size in MiB: integer within [1, 100], otherwise the default.
pub fn size_mb(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| SIZE_MB_RANGE.contains(n))
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_SIZE_MB)
}

/// Delay in seconds: finite float within [0, 10], otherwise the default.
pub fn delay_seconds(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|f| DELAY_SECONDS_RANGE.contains(f))
        .unwrap_or(DEFAULT_DELAY_SECONDS)
}

/// Failure probability: finite float within [0, 1], otherwise the default.
pub fn error_rate(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|f| (0.0..=1.0).contains(f))
        .unwrap_or(DEFAULT_ERROR_RATE)
}
