//! Tuning parameters supplied once at construction

use crate::{
    constants::{
        DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE_ALTITUDE, DEFAULT_PROCESS_NOISE_BIAS,
        DEFAULT_RESIDUAL_GATE_THRESHOLD,
    },
    errors::{EstimatorError, EstimatorResult},
};

/// Covariance correction form used by the measurement update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CovarianceForm {
    /// `P = P - K·(H·P)`: cheap, relies on conditioning to stay PSD
    #[default]
    Simple,
    /// `P = (I - K·H)·P·(I - K·H)ᵀ + K·R·Kᵀ`: stable under long runs
    Joseph,
}

/// Filter tuning, immutable once the estimator is built
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TuningParameters {
    /// Process noise scaling the altitude/velocity block of Q (qa)
    pub process_noise_altitude: f64,
    /// Process noise of the bias random walk (qb)
    pub process_noise_bias: f64,
    /// Measurement noise variance (R)
    pub measurement_noise: f64,
    /// Residuals with magnitude below this are discarded as jitter (m)
    pub residual_gate_threshold: f64,
    /// Covariance correction form
    pub covariance_form: CovarianceForm,
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self {
            process_noise_altitude: DEFAULT_PROCESS_NOISE_ALTITUDE,
            process_noise_bias: DEFAULT_PROCESS_NOISE_BIAS,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            residual_gate_threshold: DEFAULT_RESIDUAL_GATE_THRESHOLD,
            covariance_form: CovarianceForm::Simple,
        }
    }
}

impl TuningParameters {
    /// Set altitude process noise (higher = less trust in the motion model)
    pub fn with_process_noise_altitude(mut self, noise: f64) -> Self {
        self.process_noise_altitude = noise;
        self
    }

    /// Set bias process noise (higher = bias allowed to wander faster)
    pub fn with_process_noise_bias(mut self, noise: f64) -> Self {
        self.process_noise_bias = noise;
        self
    }

    /// Set measurement noise variance
    pub fn with_measurement_noise(mut self, noise: f64) -> Self {
        self.measurement_noise = noise;
        self
    }

    /// Set the residual gate (0 disables gating)
    pub fn with_residual_gate_threshold(mut self, threshold: f64) -> Self {
        self.residual_gate_threshold = threshold;
        self
    }

    /// Select the covariance correction form
    pub fn with_covariance_form(mut self, form: CovarianceForm) -> Self {
        self.covariance_form = form;
        self
    }

    /// Check every value is finite and non-negative
    pub fn validate(&self) -> EstimatorResult<()> {
        let checks = [
            ("process_noise_altitude", self.process_noise_altitude),
            ("process_noise_bias", self.process_noise_bias),
            ("measurement_noise", self.measurement_noise),
            ("residual_gate_threshold", self.residual_gate_threshold),
        ];

        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(EstimatorError::InvalidParameter { name, value });
            }
        }

        Ok(())
    }
}
