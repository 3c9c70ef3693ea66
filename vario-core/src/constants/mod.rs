//! Constants for Vario Core
//!
//! Centralized numeric values used by the estimator and the sample feeds.
//! Each constant states its unit and where the value comes from.
//!
//! ## Organization
//!
//! - **Estimator**: default tuning, initial conditions, numerical guards
//! - **Time**: unit conversions and the cold-start interval
//! - **Sensors**: barometer unit conversions

/// Estimator tuning defaults and numerical guards.
pub mod estimator;

/// Time-related constants for interval computation.
pub mod time;

/// Barometric sensor unit conversions.
pub mod sensors;

pub use estimator::{
    DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE_ALTITUDE, DEFAULT_PROCESS_NOISE_BIAS,
    DEFAULT_RESIDUAL_GATE_THRESHOLD, MIN_INNOVATION_COVARIANCE, SYMMETRY_TOLERANCE,
};

pub use time::{COLD_START_DT_S, MS_PER_SECOND};

pub use sensors::HPA_PER_KPA;
