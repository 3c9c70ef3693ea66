//! Core estimation engine for Vario
//!
//! Fuses noisy barometric altitude samples into a smoothed estimate of
//! altitude, vertical speed and sensor bias with a 3-state linear Kalman
//! filter. Designed to run on irregular, externally-driven sampling.
//!
//! Key constraints:
//! - No heap allocation in the update path
//! - Builds without `std` (the shared estimate and file replay need it)
//! - Covariance stays symmetric and non-negative on its diagonal forever
//!
//! ```no_run
//! use vario_core::{AltitudeEstimator, TuningParameters, MonotonicTime};
//!
//! let mut estimator = AltitudeEstimator::new(TuningParameters::default(), MonotonicTime::new())?;
//!
//! // Feed a barometric altitude reading (meters)
//! estimator.update(12.4)?;
//! println!("altitude {:.2} m, climbing {:.2} m/s", estimator.altitude(), estimator.vertical_speed());
//! # Ok::<(), vario_core::EstimatorError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod constants;
pub mod errors;
pub mod estimator;
pub mod feed;
pub mod sample;
pub mod stream;
pub mod time;
pub mod traits;

#[cfg(feature = "std")]
pub mod shared;

// Public API
pub use errors::{EstimatorError, EstimatorResult};
pub use estimator::{
    AltitudeEstimator, Covariance, CovarianceForm, FilterState, TuningParameters, UpdateOutcome,
};
pub use feed::{FeedStats, FeedStatus, SampleFeed};
pub use sample::AltitudeSample;
pub use time::{ManualTime, Timestamp};
pub use traits::{SampleSink, Stream, TimeSource};

#[cfg(feature = "std")]
pub use time::{MonotonicTime, SystemTime};

#[cfg(feature = "std")]
pub use shared::{share, EstimateReader, EstimateSnapshot, EstimatorWriter, SubscriptionId};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
