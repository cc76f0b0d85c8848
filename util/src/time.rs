//! General time utility functions

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of fixed-period cycles into elapsed seconds.
pub fn cycles_to_seconds(num_cycles: u64, cycle_period_s: f64) -> f64 {
    num_cycles as f64 * cycle_period_s
}
