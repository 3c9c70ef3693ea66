//! Pull-based sample feed
//!
//! Connects a [`Stream`] of samples to a [`SampleSink`], one sample per
//! update, in stream order. No numeric logic lives here: the feed only
//! decides whether a sample reaches the sink and keeps count of what
//! happened to it.
//!
//! ## Usage
//!
//! ```rust
//! use vario_core::{AltitudeEstimator, AltitudeSample, ManualTime, SampleFeed, TuningParameters};
//! use vario_core::stream::MemoryStream;
//!
//! let samples = [AltitudeSample::new(1000, 10.02), AltitudeSample::new(2000, 10.01)];
//! let clock = ManualTime::new(0);
//! let mut estimator = AltitudeEstimator::new(TuningParameters::default(), &clock)?;
//!
//! let mut feed = SampleFeed::new(MemoryStream::new(&samples), &mut estimator);
//! let stats = feed.drain();
//! assert_eq!(stats.received, 2);
//! # Ok::<(), vario_core::EstimatorError>(())
//! ```

use core::fmt;

use crate::{
    errors::{EstimatorError, EstimatorResult},
    estimator::UpdateOutcome,
    sample::AltitudeSample,
    stream::StreamError,
    traits::{SampleSink, Stream},
};

/// Lifecycle of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Still forwarding samples
    Active,
    /// Source reached end of stream
    Ended,
    /// Source failed; nothing more will be forwarded
    Failed,
}

/// What happened to the samples a feed has seen
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    /// Samples taken from the source
    pub received: u64,
    /// Samples that corrected the estimate
    pub applied: u64,
    /// Samples discarded by the residual gate
    pub gated: u64,
    /// Samples skipped on a degenerate innovation covariance
    pub degenerate: u64,
    /// Non-finite samples rejected before reaching the filter
    pub rejected: u64,
    /// Malformed records the source skipped
    pub malformed: u64,
}

impl FeedStats {
    /// Count the result of forwarding one sample
    pub fn record(&mut self, result: &EstimatorResult<UpdateOutcome>) {
        self.received += 1;
        match result {
            Ok(UpdateOutcome::Corrected { .. }) => self.applied += 1,
            Ok(UpdateOutcome::Gated { .. }) => self.gated += 1,
            Ok(UpdateOutcome::Degenerate { .. }) => self.degenerate += 1,
            Err(EstimatorError::InvalidMeasurement { .. }) => self.rejected += 1,
            // Construction-time error, cannot come out of an update
            Err(EstimatorError::InvalidParameter { .. }) => self.rejected += 1,
        }
    }
}

/// Drives a sink from a pull-based stream
pub struct SampleFeed<S, K> {
    stream: S,
    sink: K,
    status: FeedStatus,
    stats: FeedStats,
}

impl<S, K, E> SampleFeed<S, K>
where
    S: Stream<Item = AltitudeSample, Error = StreamError<E>>,
    K: SampleSink,
    E: fmt::Debug,
{
    /// Create a feed in the active state
    pub fn new(stream: S, sink: K) -> Self {
        Self {
            stream,
            sink,
            status: FeedStatus::Active,
            stats: FeedStats::default(),
        }
    }

    /// Forward the next available sample
    ///
    /// Returns:
    /// - `Ok(Some(outcome))` - sample went through the filter
    /// - `Ok(None)` - sample was rejected or the record was malformed
    /// - `Err(nb::Error::WouldBlock)` - nothing available yet
    /// - `Err(nb::Error::Other(status))` - feed has stopped (sticky)
    pub fn pump_next(&mut self) -> nb::Result<Option<UpdateOutcome>, FeedStatus> {
        if self.status != FeedStatus::Active {
            return Err(nb::Error::Other(self.status));
        }

        match self.stream.poll_next() {
            Ok(sample) => {
                let result = self.sink.update_at(sample.relative_altitude_m, sample.timestamp);
                self.stats.record(&result);
                match result {
                    Ok(outcome) => Ok(Some(outcome)),
                    Err(e) => {
                        log_debug!("dropping sample at {}: {:?}", sample.timestamp, e);
                        Ok(None)
                    }
                }
            }
            Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(e)) if e.is_recoverable() => {
                log_debug!("skipping malformed record: {:?}", e);
                self.stats.malformed += 1;
                Ok(None)
            }
            Err(nb::Error::Other(StreamError::EndOfStream)) => {
                log_debug!("sample stream ended after {} samples", self.stats.received);
                self.status = FeedStatus::Ended;
                Err(nb::Error::Other(self.status))
            }
            Err(nb::Error::Other(e)) => {
                log_warn!("sample stream failed: {:?}", e);
                self.status = FeedStatus::Failed;
                Err(nb::Error::Other(self.status))
            }
        }
    }

    /// Forward up to `max_samples`, stopping early when nothing is available
    ///
    /// Returns how many samples were taken from the stream.
    pub fn pump(&mut self, max_samples: usize) -> usize {
        let start = self.stats.received + self.stats.malformed;

        for _ in 0..max_samples {
            if self.pump_next().is_err() {
                break;
            }
        }

        (self.stats.received + self.stats.malformed - start) as usize
    }

    /// Forward everything currently available
    pub fn drain(&mut self) -> FeedStats {
        while self.pump_next().is_ok() {}
        self.stats
    }

    /// Current lifecycle state
    pub fn status(&self) -> FeedStatus {
        self.status
    }

    /// Counters so far
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// The sink being driven
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the stream and sink
    pub fn into_parts(self) -> (S, K) {
        (self.stream, self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimator::{AltitudeEstimator, TuningParameters},
        stream::MemoryStream,
        time::ManualTime,
    };

    /// Stream that fails after yielding its samples
    struct FailingStream {
        remaining: usize,
    }

    impl Stream for FailingStream {
        type Item = AltitudeSample;
        type Error = StreamError<&'static str>;

        fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
            if self.remaining == 0 {
                return Err(nb::Error::Other(StreamError::Transport("sensor unavailable")));
            }
            self.remaining -= 1;
            Ok(AltitudeSample::new(1000, 5.0))
        }
    }

    #[test]
    fn forwards_in_order_until_end() {
        let samples = [
            AltitudeSample::new(1000, 10.02),
            AltitudeSample::new(2000, f64::NAN),
            AltitudeSample::new(3000, 10.03),
        ];
        let clock = ManualTime::new(0);
        let mut estimator = AltitudeEstimator::new(TuningParameters::default(), &clock).unwrap();

        let mut feed = SampleFeed::new(MemoryStream::new(&samples), &mut estimator);
        let stats = feed.drain();

        assert_eq!(feed.status(), FeedStatus::Ended);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.applied + stats.gated, 2);

        // Sticky once stopped
        assert!(matches!(feed.pump_next(), Err(nb::Error::Other(FeedStatus::Ended))));

        drop(feed);
        assert_eq!(estimator.state().last_update, Some(3000));
        assert_eq!(estimator.update_count(), 2);
    }

    #[test]
    fn source_failure_stops_forwarding() {
        let clock = ManualTime::new(0);
        let mut estimator = AltitudeEstimator::new(TuningParameters::default(), &clock).unwrap();

        let mut feed = SampleFeed::new(FailingStream { remaining: 2 }, &mut estimator);
        assert_eq!(feed.pump(10), 2);
        assert_eq!(feed.status(), FeedStatus::Failed);

        let before = *feed.sink().state();
        assert!(feed.pump_next().is_err());
        assert_eq!(*feed.sink().state(), before);
    }

    #[test]
    fn pump_respects_limit() {
        let samples: [AltitudeSample; 5] =
            core::array::from_fn(|i| AltitudeSample::new(i as u64 * 1000, 1.0 + i as f64));
        let clock = ManualTime::new(0);
        let estimator = AltitudeEstimator::new(TuningParameters::default(), &clock).unwrap();

        let mut feed = SampleFeed::new(MemoryStream::new(&samples), estimator);
        assert_eq!(feed.pump(3), 3);
        assert_eq!(feed.status(), FeedStatus::Active);
        assert_eq!(feed.pump(10), 2);
        assert_eq!(feed.status(), FeedStatus::Ended);
    }
}
