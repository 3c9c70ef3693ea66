//! Time management for the estimator
//!
//! Provides the clocks behind [`TimeSource`]:
//! - Monotonic timer (interval measurement, the production default)
//! - System clock (wall clock time, std only)
//! - Manual clock (tests and deterministic replays)

use core::sync::atomic::{AtomicU64, Ordering};

pub use crate::traits::TimeSource;

/// Timestamp in milliseconds since epoch (or since the clock was created for monotonic)
pub type Timestamp = u64;

/// Monotonic time source backed by `std::time::Instant`
///
/// Starts at 0 when created, always increases.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start a new monotonic clock at 0 ms
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Manually driven time source
///
/// Interior mutability lets a test keep advancing the clock while an
/// estimator holds a shared reference to it.
#[derive(Debug, Default)]
pub struct ManualTime {
    timestamp: AtomicU64,
}

impl ManualTime {
    /// Create a clock reading `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: AtomicU64::new(timestamp),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.store(timestamp, Ordering::Release);
    }

    /// Move forward by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.timestamp.fetch_add(ms, Ordering::AcqRel);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Timestamp {
        self.timestamp.load(Ordering::Acquire)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Seconds elapsed from `earlier` to `later`, zero if time went backwards
pub fn elapsed_seconds(earlier: Timestamp, later: Timestamp) -> f64 {
    later.saturating_sub(earlier) as f64 / crate::constants::MS_PER_SECOND as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_time_advances() {
        let time = ManualTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);

        time.set(200);
        assert_eq!(time.now(), 200);
    }

    #[test]
    fn shared_reference_is_a_time_source() {
        fn read<T: TimeSource>(source: T) -> Timestamp {
            source.now()
        }

        let time = ManualTime::new(42);
        assert_eq!(read(&time), 42);
    }

    #[test]
    fn elapsed_handles_backwards_time() {
        assert_eq!(elapsed_seconds(1000, 2500), 1.5);
        assert_eq!(elapsed_seconds(2500, 1000), 0.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_time_never_decreases() {
        let time = MonotonicTime::new();
        let first = time.now();
        let second = time.now();
        assert!(second >= first);
        assert!(!time.is_wall_clock());
    }
}
