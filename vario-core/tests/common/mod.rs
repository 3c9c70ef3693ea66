//! Shared fixtures for the integration tests
//!
//! - Seeded generators for noisy barometric traces
//! - Estimator constructors with a manual clock
//! - Tolerance assertions

#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};

use vario_core::{AltitudeEstimator, AltitudeSample, ManualTime, Timestamp, TuningParameters};

macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        let diff = (actual - expected).abs();
        if diff > $tolerance {
            panic!(
                "Value {} not within tolerance {} of expected {} (diff: {})",
                actual, $tolerance, expected, diff
            );
        }
    };
}

/// Estimator on a manual clock starting at zero
pub fn estimator(tuning: TuningParameters) -> AltitudeEstimator<ManualTime> {
    AltitudeEstimator::new(tuning, ManualTime::new(0)).expect("valid tuning")
}

/// Estimator with default tuning
pub fn default_estimator() -> AltitudeEstimator<ManualTime> {
    estimator(TuningParameters::default())
}

/// Seeded generator of barometric altitude traces
pub struct TraceGenerator {
    rng: StdRng,
}

impl TraceGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Constant altitude with uniform noise of `±amplitude`
    pub fn constant(
        &mut self,
        altitude: f64,
        amplitude: f64,
        count: usize,
        interval_ms: u64,
    ) -> Vec<AltitudeSample> {
        (1..=count as u64)
            .map(|i| {
                let noise = self.rng.gen_range(-amplitude..=amplitude);
                AltitudeSample::new(i * interval_ms, altitude + noise)
            })
            .collect()
    }

    /// Steady climb at `rate` m/s with uniform noise of `±amplitude`
    pub fn climb(
        &mut self,
        rate: f64,
        amplitude: f64,
        count: usize,
        interval_ms: u64,
    ) -> Vec<AltitudeSample> {
        (1..=count as u64)
            .map(|i| {
                let t = (i * interval_ms) as f64 / 1000.0;
                let noise = self.rng.gen_range(-amplitude..=amplitude);
                AltitudeSample::new(i * interval_ms, rate * t + noise)
            })
            .collect()
    }

    /// Irregular timestamps between `min_ms` and `max_ms` apart
    pub fn jittered_timestamps(&mut self, count: usize, min_ms: u64, max_ms: u64) -> Vec<Timestamp> {
        let mut t = 0;
        (0..count)
            .map(|_| {
                t += self.rng.gen_range(min_ms..=max_ms);
                t
            })
            .collect()
    }
}

/// Run every sample through the estimator, returning the observed altitude after each
pub fn run_trace(
    estimator: &mut AltitudeEstimator<ManualTime>,
    samples: &[AltitudeSample],
) -> Vec<f64> {
    samples
        .iter()
        .map(|sample| {
            estimator
                .update_at(sample.relative_altitude_m, sample.timestamp)
                .expect("finite sample");
            estimator.observed_altitude()
        })
        .collect()
}

/// Sample variance around a known mean
pub fn variance_around(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
