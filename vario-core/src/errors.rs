//! Error Types for the Altitude Estimator
//!
//! ## Design Philosophy
//!
//! The estimator treats almost everything as a normal operating outcome:
//!
//! - A residual below the gate threshold is jitter, not an error
//! - A near-zero innovation covariance skips the correction step
//! - A sensor stream that ends leaves the last estimate in place
//!
//! Those are reported through [`UpdateOutcome`](crate::estimator::UpdateOutcome).
//! Only two conditions cross the boundary as errors:
//!
//! ### Invalid Measurement
//! A NaN or infinite reading. It is rejected before any state is touched:
//! one non-finite value propagated through the covariance would poison every
//! later estimate with no way back short of a new filter.
//!
//! ### Invalid Parameter
//! Negative or non-finite tuning values supplied at construction.
//!
//! Errors are `Copy` and carry only inline data (`&'static str`, `f64`) so
//! they can be returned from the update path without allocation.
//!
//! ```rust
//! use vario_core::{AltitudeEstimator, EstimatorError, ManualTime, TuningParameters};
//!
//! let clock = ManualTime::new(0);
//! let mut estimator = AltitudeEstimator::new(TuningParameters::default(), &clock).unwrap();
//!
//! match estimator.update(f64::NAN) {
//!     Err(EstimatorError::InvalidMeasurement { .. }) => {
//!         // Sample dropped, estimate untouched
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for estimator operations
pub type EstimatorResult<T> = Result<T, EstimatorError>;

/// Estimator errors - kept small and `Copy` for the hot path
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EstimatorError {
    /// Measurement is NaN or infinite
    #[error("Invalid measurement {value}: not a finite number")]
    InvalidMeasurement {
        /// The rejected reading
        value: f64,
    },

    /// Tuning parameter is negative or not finite
    #[error("Invalid tuning parameter {name} = {value}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Value that was supplied
        value: f64,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for EstimatorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidMeasurement { value } =>
                defmt::write!(fmt, "Invalid measurement {}", value),
            Self::InvalidParameter { name, value } =>
                defmt::write!(fmt, "Invalid parameter {} = {}", name, value),
        }
    }
}
