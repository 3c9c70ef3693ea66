//! Feed configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default:
//!
//! ```json
//! {
//!   "tuning": {
//!     "process_noise_altitude": 0.0005,
//!     "process_noise_bias": 0.005,
//!     "measurement_noise": 0.01,
//!     "residual_gate_threshold": 0.01,
//!     "covariance_form": "simple"
//!   },
//!   "clock": "sample"
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vario_core::{CovarianceForm, EstimatorError, TuningParameters};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON or unknown values
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Tuning rejected by the estimator
    #[error("Invalid tuning: {0}")]
    Invalid(#[from] EstimatorError),
}

/// Which timestamp drives the filter's time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Timestamp carried by the sample
    #[default]
    Sample,
    /// Estimator clock at the moment the sample is processed
    Arrival,
}

/// Everything a feed adapter needs besides its source and clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Filter tuning
    pub tuning: TuningParameters,
    /// Time step policy
    pub clock: TimestampPolicy,
}

impl FeedConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the tuning the estimator will be built with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tuning.validate()?;
        Ok(())
    }

    /// Set the filter tuning
    pub fn with_tuning(mut self, tuning: TuningParameters) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the time step policy
    pub fn with_clock(mut self, clock: TimestampPolicy) -> Self {
        self.clock = clock;
        self
    }

    /// Shorthand for switching the covariance correction form
    pub fn with_covariance_form(mut self, form: CovarianceForm) -> Self {
        self.tuning = self.tuning.with_covariance_form(form);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = FeedConfig::from_json("{}").unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.clock, TimestampPolicy::Sample);
    }

    #[test]
    fn partial_tuning_keeps_other_defaults() {
        let config = FeedConfig::from_json(
            r#"{ "tuning": { "measurement_noise": 0.04, "covariance_form": "joseph" }, "clock": "arrival" }"#,
        )
        .unwrap();

        assert_eq!(config.tuning.measurement_noise, 0.04);
        assert_eq!(config.tuning.covariance_form, CovarianceForm::Joseph);
        assert_eq!(
            config.tuning.process_noise_bias,
            TuningParameters::default().process_noise_bias
        );
        assert_eq!(config.clock, TimestampPolicy::Arrival);
    }

    #[test]
    fn rejects_invalid_tuning() {
        let err = FeedConfig::from_json(r#"{ "tuning": { "process_noise_bias": -1.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(EstimatorError::InvalidParameter { name: "process_noise_bias", .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            FeedConfig::from_json(r#"{ "clock": "sundial" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let config = FeedConfig::default()
            .with_clock(TimestampPolicy::Arrival)
            .with_covariance_form(CovarianceForm::Joseph);
        let parsed = FeedConfig::from_json(&config.to_json().unwrap()).unwrap();

        assert_eq!(parsed.clock, config.clock);
        assert_eq!(parsed.tuning.covariance_form, CovarianceForm::Joseph);
        assert!((parsed.tuning.process_noise_altitude - config.tuning.process_noise_altitude).abs() < 1e-15);
    }
}
