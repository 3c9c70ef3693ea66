//! Measurement sinks
//!
//! Feeds (pull-based here, push-based in `vario-connectors`) forward each
//! sample to a sink without knowing whether it is a bare estimator or the
//! writer half of a shared one.

use crate::{
    errors::EstimatorResult,
    estimator::{AltitudeEstimator, UpdateOutcome},
    time::Timestamp,
    traits::TimeSource,
};

/// Anything that accepts altitude measurements one at a time
pub trait SampleSink {
    /// Apply a measurement stamped with the sink's own clock
    fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome>;

    /// Apply a measurement taken at `timestamp`
    fn update_at(&mut self, measurement: f64, timestamp: Timestamp) -> EstimatorResult<UpdateOutcome>;
}

impl<C: TimeSource> SampleSink for AltitudeEstimator<C> {
    fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome> {
        AltitudeEstimator::update(self, measurement)
    }

    fn update_at(&mut self, measurement: f64, timestamp: Timestamp) -> EstimatorResult<UpdateOutcome> {
        AltitudeEstimator::update_at(self, measurement, timestamp)
    }
}

impl<T: SampleSink + ?Sized> SampleSink for &mut T {
    fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome> {
        (**self).update(measurement)
    }

    fn update_at(&mut self, measurement: f64, timestamp: Timestamp) -> EstimatorResult<UpdateOutcome> {
        (**self).update_at(measurement, timestamp)
    }
}
