//! Time-Related Constants

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Interval assumed for the very first predict cycle (seconds).
///
/// With no previous timestamp there is no elapsed time to measure; one
/// second matches the nominal 1 Hz barometer rate.
pub const COLD_START_DT_S: f64 = 1.0;
