//! Barometric altitude samples
//!
//! The unit of data flowing from a sensor source into the estimator. The
//! acquisition layer produces these at whatever rate the hardware delivers;
//! nothing here assumes a fixed cadence.

use crate::{constants::HPA_PER_KPA, time::Timestamp};

/// One timestamped barometer reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AltitudeSample {
    /// When the sensor produced the reading (ms)
    pub timestamp: Timestamp,
    /// Altitude relative to where the session started (m)
    pub relative_altitude_m: f64,
    /// Raw station pressure if the sensor reports it (kPa)
    #[cfg_attr(feature = "serde", serde(default))]
    pub pressure_kpa: Option<f64>,
}

impl AltitudeSample {
    /// Create a sample without a pressure reading
    pub fn new(timestamp: Timestamp, relative_altitude_m: f64) -> Self {
        Self {
            timestamp,
            relative_altitude_m,
            pressure_kpa: None,
        }
    }

    /// Attach the raw pressure reading (kPa)
    pub fn with_pressure_kpa(mut self, pressure_kpa: f64) -> Self {
        self.pressure_kpa = Some(pressure_kpa);
        self
    }

    /// Pressure in hectopascals, if reported
    pub fn pressure_hpa(&self) -> Option<f64> {
        self.pressure_kpa.map(|kpa| kpa * HPA_PER_KPA)
    }

    /// Whether the altitude can be fed to the estimator
    pub fn is_finite(&self) -> bool {
        self.relative_altitude_m.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_conversion() {
        let sample = AltitudeSample::new(1000, 3.2).with_pressure_kpa(101.325);
        let hpa = sample.pressure_hpa().unwrap();
        assert!((hpa - 1013.25).abs() < 1e-9);

        assert_eq!(AltitudeSample::new(1000, 3.2).pressure_hpa(), None);
    }

    #[test]
    fn finiteness() {
        assert!(AltitudeSample::new(0, 1.0).is_finite());
        assert!(!AltitudeSample::new(0, f64::NAN).is_finite());
        assert!(!AltitudeSample::new(0, f64::NEG_INFINITY).is_finite());
    }
}
