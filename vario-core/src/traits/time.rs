//! Time Source Abstraction
//!
//! The estimator scales its process noise by the time elapsed since the
//! previous cycle, so it needs a clock. This trait keeps the clock pluggable:
//! a monotonic timer in production, a manually advanced one in tests.
//!
//! ## Choosing a Source
//!
//! - `MonotonicTime`: never jumps, the right choice for interval measurement
//! - `SystemTime`: wall clock, may step backwards after an NTP adjustment
//! - `ManualTime`: deterministic, advanced explicitly by tests and replays
//!
//! The estimator never lets its stored timestamp move backwards, so a wall
//! clock that steps back only costs one zero-length interval.

use crate::time::Timestamp;

/// Source of time for the estimator
///
/// ## Example Implementation
///
/// ```rust
/// use vario_core::traits::TimeSource;
/// use vario_core::time::Timestamp;
///
/// struct GpsTime {
///     last_fix_ms: Timestamp,
/// }
///
/// impl TimeSource for GpsTime {
///     fn now(&self) -> Timestamp {
///         self.last_fix_ms
///     }
///
///     fn is_wall_clock(&self) -> bool {
///         true
///     }
/// }
/// ```
pub trait TimeSource: Send {
    /// Get current timestamp in milliseconds
    ///
    /// The epoch depends on the implementation:
    /// - Monotonic sources: milliseconds since the source was created
    /// - Wall clock sources: milliseconds since the Unix epoch
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

impl<T: TimeSource + Sync + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }
}
