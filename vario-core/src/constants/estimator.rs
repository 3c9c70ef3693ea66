//! Estimator Constants
//!
//! Default tuning for the barometric altitude filter plus the guards that
//! keep the covariance arithmetic well-behaved.

// ===== DEFAULT TUNING =====

/// Default process noise for the altitude/velocity pair (m²/s⁴ scale).
///
/// Scales the white-acceleration process noise block of Q.
///
/// Source: iOS demo app's shared filter instance
pub const DEFAULT_PROCESS_NOISE_ALTITUDE: f64 = 0.0005;

/// Default process noise for the bias random walk (m² per cycle).
///
/// Ten times the altitude term, so slow pressure drift lands in the bias.
///
/// Source: iOS demo app's shared filter instance
pub const DEFAULT_PROCESS_NOISE_BIAS: f64 = 0.005;

/// Default measurement noise variance (m²).
///
/// Source: iOS demo app's shared filter instance
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.01;

/// Default residual gate (m).
///
/// Residuals smaller than this are treated as jitter and skip the
/// correction step entirely.
///
/// Source: iOS demo app's filter, where the gate is hard-coded
pub const DEFAULT_RESIDUAL_GATE_THRESHOLD: f64 = 0.01;

// ===== INITIAL CONDITIONS =====

/// Initial variance on every state component.
///
/// Identity covariance: the filter starts with no knowledge and lets the
/// first few samples pull it in.
pub const INITIAL_VARIANCE: f64 = 1.0;

// ===== NUMERICAL GUARDS =====

/// Smallest innovation covariance the gain computation will divide by.
///
/// Caller-supplied tuning can drive S toward zero (zero measurement noise
/// plus a collapsed covariance). Below this value the correction is skipped.
pub const MIN_INNOVATION_COVARIANCE: f64 = 1e-12;

/// Tolerance used when checking covariance symmetry.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;
