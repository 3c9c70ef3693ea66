//! Kalman Filter for Barometric Altitude
//!
//! ## Overview
//!
//! This module fuses a single stream of noisy barometric altitude readings
//! into an estimate of altitude, vertical speed and sensor bias. Each reading
//! runs one full predict/update cycle; the interval between cycles comes from
//! the reading's timestamp, so irregular sampling is handled natively.
//!
//! ## State Model
//!
//! Constant velocity plus a slowly wandering bias:
//!
//! ```text
//! x = [altitude, vertical_speed, bias]ᵀ
//!
//!     ⎡1  dt  0⎤
//! F = ⎢0   1  0⎥        H = [1  0  1]
//!     ⎣0   0  1⎦
//!
//!     ⎡dt⁴/4·qa  dt³/2·qa   0⎤
//! Q = ⎢dt³/2·qa   dt²·qa    0⎥
//!     ⎣   0         0      qb⎦
//! ```
//!
//! The off-diagonal Q terms carry velocity noise into altitude noise over
//! the interval; a diagonal-only Q under-estimates altitude uncertainty.
//!
//! ## Cycle
//!
//! ### 1. Prediction
//! ```text
//! dt  = now - last_update          (1 s on the first cycle)
//! x̂   = F·x
//! P   = F·P·Fᵀ + Q
//! ```
//!
//! ### 2. Update
//! ```text
//! y   = z - (altitude + bias)
//! |y| < gate  →  stop here (jitter)
//! S   = P00 + 2·P02 + P22 + R
//! K   = P·Hᵀ / S
//! x   = x + K·y
//! P   = P - K·(H·P)               (or the Joseph form)
//! ```
//!
//! ## Observability
//!
//! The barometer sees `altitude + bias` only. That sum converges to the
//! measured altitude; how it splits between altitude and bias is driven by
//! the ratio of `qa` to `qb`, not by the data.
//!
//! ## Numerical Stability
//!
//! - Covariance entries are written in mirrored pairs from one expression
//! - Negative variances are clamped to zero after every correction
//! - Non-finite measurements are rejected before touching any state
//! - A near-zero innovation covariance skips the correction
//!
//! ## Usage Example
//!
//! ```rust
//! use vario_core::{AltitudeEstimator, ManualTime, TuningParameters, UpdateOutcome};
//!
//! let clock = ManualTime::new(0);
//! let mut estimator = AltitudeEstimator::new(TuningParameters::default(), &clock)?;
//!
//! for reading in [10.02, 10.01, 10.03, 10.00] {
//!     clock.advance(1000);
//!     match estimator.update(reading)? {
//!         UpdateOutcome::Corrected { residual, .. } => println!("corrected by {residual:.3} m"),
//!         UpdateOutcome::Gated { .. } => println!("jitter ignored"),
//!         UpdateOutcome::Degenerate { .. } => println!("correction skipped"),
//!     }
//! }
//!
//! assert!((estimator.observed_altitude() - 10.0).abs() < 0.1);
//! # Ok::<(), vario_core::EstimatorError>(())
//! ```

pub mod state;
pub mod tuning;

pub use state::{Covariance, FilterState};
pub use tuning::{CovarianceForm, TuningParameters};

use crate::{
    constants::{COLD_START_DT_S, MIN_INNOVATION_COVARIANCE},
    errors::{EstimatorError, EstimatorResult},
    time::{elapsed_seconds, Timestamp},
    traits::TimeSource,
};

/// Result of a completed update cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// Measurement applied
    Corrected {
        /// Measurement minus predicted observation (m)
        residual: f64,
        /// Kalman gain for (altitude, vertical speed, bias)
        gain: [f64; 3],
        /// Innovation covariance S (m²)
        innovation_covariance: f64,
    },
    /// Residual below the gate threshold, prediction kept as is
    Gated {
        /// Measurement minus predicted observation (m)
        residual: f64,
    },
    /// Innovation covariance too small to divide by, prediction kept as is
    Degenerate {
        /// Innovation covariance S (m²)
        innovation_covariance: f64,
    },
}

impl UpdateOutcome {
    /// Residual, when one was evaluated against the gate
    pub fn residual(&self) -> Option<f64> {
        match self {
            Self::Corrected { residual, .. } | Self::Gated { residual } => Some(*residual),
            Self::Degenerate { .. } => None,
        }
    }

    /// Whether the measurement changed the estimate
    pub fn is_corrected(&self) -> bool {
        matches!(self, Self::Corrected { .. })
    }
}

/// Barometric altitude estimator
///
/// Owns the filter state exclusively; every mutation goes through
/// [`predict`](Self::predict) or [`update`](Self::update). Share it across
/// threads with [`crate::shared::share`].
#[derive(Debug)]
pub struct AltitudeEstimator<C: TimeSource> {
    state: FilterState,
    tuning: TuningParameters,
    clock: C,
    update_count: u64,
}

impl<C: TimeSource> AltitudeEstimator<C> {
    /// Create an estimator at altitude 0 with identity covariance
    ///
    /// Fails if any tuning value is negative or not finite.
    pub fn new(tuning: TuningParameters, clock: C) -> EstimatorResult<Self> {
        tuning.validate()?;

        Ok(Self {
            state: FilterState::default(),
            tuning,
            clock,
            update_count: 0,
        })
    }

    /// Time update stamped with the clock's current time
    ///
    /// Returns the interval (s) the state was propagated over.
    pub fn predict(&mut self) -> f64 {
        let now = self.clock.now();
        self.predict_at(now)
    }

    /// Time update to `timestamp`
    ///
    /// Returns the interval (s) the state was propagated over: 1 s when
    /// cold, 0 s if `timestamp` is earlier than the previous cycle.
    pub fn predict_at(&mut self, timestamp: Timestamp) -> f64 {
        let dt = self.advance_to(timestamp);
        self.propagate(dt);
        dt
    }

    /// Measurement update stamped with the clock's current time
    pub fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome> {
        let now = self.clock.now();
        self.update_at(measurement, now)
    }

    /// Full predict/update cycle for a reading taken at `timestamp`
    ///
    /// Non-finite readings are rejected before any state changes.
    pub fn update_at(
        &mut self,
        measurement: f64,
        timestamp: Timestamp,
    ) -> EstimatorResult<UpdateOutcome> {
        if !measurement.is_finite() {
            log_warn!("rejecting non-finite measurement {}", measurement);
            return Err(EstimatorError::InvalidMeasurement { value: measurement });
        }

        self.predict_at(timestamp);
        self.update_count += 1;

        let residual = measurement - self.state.observed_altitude();
        if libm::fabs(residual) < self.tuning.residual_gate_threshold {
            log_trace!("residual {} below gate, skipping correction", residual);
            return Ok(UpdateOutcome::Gated { residual });
        }

        Ok(self.correct(residual))
    }

    /// Current altitude estimate (m)
    pub fn altitude(&self) -> f64 {
        self.state.altitude
    }

    /// Current vertical speed estimate (m/s)
    pub fn vertical_speed(&self) -> f64 {
        self.state.vertical_speed
    }

    /// Current bias estimate (m)
    pub fn bias(&self) -> f64 {
        self.state.bias
    }

    /// Predicted raw reading: altitude plus bias (m)
    pub fn observed_altitude(&self) -> f64 {
        self.state.observed_altitude()
    }

    /// Current covariance
    pub fn covariance(&self) -> &Covariance {
        &self.state.covariance
    }

    /// Full filter state
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Tuning supplied at construction
    pub fn tuning(&self) -> &TuningParameters {
        &self.tuning
    }

    /// Clock used by `predict` and `update`
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether at least one cycle has run
    pub fn is_warm(&self) -> bool {
        self.state.is_warm()
    }

    /// Measurements accepted so far (gated and degenerate included)
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Record `timestamp` and return the interval since the previous cycle
    fn advance_to(&mut self, timestamp: Timestamp) -> f64 {
        match self.state.last_update {
            None => {
                self.state.last_update = Some(timestamp);
                COLD_START_DT_S
            }
            Some(last) if timestamp >= last => {
                self.state.last_update = Some(timestamp);
                elapsed_seconds(last, timestamp)
            }
            Some(last) => {
                log_warn!(
                    "timestamp {} precedes previous cycle {}, using zero interval",
                    timestamp,
                    last
                );
                0.0
            }
        }
    }

    /// Propagate mean and covariance over `dt` seconds
    fn propagate(&mut self, dt: f64) {
        let qa = self.tuning.process_noise_altitude;
        let qb = self.tuning.process_noise_bias;
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let state = &mut self.state;
        state.altitude += dt * state.vertical_speed;

        // F·P·Fᵀ + Q expanded for the sparse F, upper triangle only
        let p = *state.covariance.as_array();
        state.covariance = Covariance::from_upper(
            p[0][0] + 2.0 * dt * p[0][1] + dt2 * p[1][1] + dt4 / 4.0 * qa,
            p[0][1] + dt * p[1][1] + dt3 / 2.0 * qa,
            p[0][2] + dt * p[1][2],
            p[1][1] + dt2 * qa,
            p[1][2],
            p[2][2] + qb,
        );
        state.covariance.condition();
    }

    /// Apply a residual that passed the gate
    fn correct(&mut self, residual: f64) -> UpdateOutcome {
        let r = self.tuning.measurement_noise;
        let p = *self.state.covariance.as_array();

        let innovation_covariance = p[0][0] + 2.0 * p[0][2] + p[2][2] + r;
        if !innovation_covariance.is_finite() || innovation_covariance < MIN_INNOVATION_COVARIANCE {
            log_warn!(
                "innovation covariance {} degenerate, skipping correction",
                innovation_covariance
            );
            return UpdateOutcome::Degenerate { innovation_covariance };
        }

        // P·Hᵀ, which equals (H·P)ᵀ while P is symmetric
        let ph = [p[0][0] + p[0][2], p[1][0] + p[1][2], p[2][0] + p[2][2]];
        let gain = ph.map(|v| v / innovation_covariance);

        self.state.altitude += gain[0] * residual;
        self.state.vertical_speed += gain[1] * residual;
        self.state.bias += gain[2] * residual;

        self.state.covariance = match self.tuning.covariance_form {
            CovarianceForm::Simple => simple_correction(&p, &gain, &ph),
            CovarianceForm::Joseph => joseph_correction(&p, &gain, r),
        };

        if self.state.covariance.condition() {
            log_debug!("covariance conditioned after update {}", self.update_count);
        }

        UpdateOutcome::Corrected {
            residual,
            gain,
            innovation_covariance,
        }
    }
}

/// `P - K·(H·P)`, upper triangle mirrored
fn simple_correction(p: &[[f64; 3]; 3], gain: &[f64; 3], hp: &[f64; 3]) -> Covariance {
    let entry = |i: usize, j: usize| p[i][j] - gain[i] * hp[j];
    Covariance::from_upper(
        entry(0, 0),
        entry(0, 1),
        entry(0, 2),
        entry(1, 1),
        entry(1, 2),
        entry(2, 2),
    )
}

/// `(I - K·H)·P·(I - K·H)ᵀ + K·R·Kᵀ`
fn joseph_correction(p: &[[f64; 3]; 3], gain: &[f64; 3], r: f64) -> Covariance {
    const H: [f64; 3] = [1.0, 0.0, 1.0];

    let mut a = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let identity = if i == j { 1.0 } else { 0.0 };
            a[i][j] = identity - gain[i] * H[j];
        }
    }

    // A·P
    let mut ap = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            ap[i][j] = (0..3).map(|k| a[i][k] * p[k][j]).sum();
        }
    }

    // (A·P)·Aᵀ + K·R·Kᵀ
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let apat: f64 = (0..3).map(|k| ap[i][k] * a[j][k]).sum();
            out[i][j] = apat + gain[i] * r * gain[j];
        }
    }

    Covariance::symmetrized(&out)
}
