//! Feed adapter: async sample source to estimator updates
//!
//! ## Lifecycle
//!
//! ```text
//! running ──source ends──────▶ Completed
//!    │    ──source error─────▶ SourceFailed
//!    ├─── stop requested ────▶ Stopped (source closed)
//!    └─── task cancelled ────▶ Cancelled (spawned feeds only)
//! ```
//!
//! The adapter owns the [`EstimatorWriter`], so it is the only thing that
//! can mutate the estimate while it runs. Readers obtained before the
//! adapter starts keep observing snapshots and notifications.

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use vario_core::{
    share, AltitudeEstimator, AltitudeSample, EstimateReader, EstimatorResult, EstimatorWriter,
    FeedStats, TimeSource, UpdateOutcome,
};

use crate::{
    config::{ConfigError, FeedConfig, TimestampPolicy},
    SampleSource, SourceError,
};

/// Why a feed stopped
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEnd {
    /// Source ended normally
    Completed,
    /// Source reported an error
    SourceFailed(SourceError),
    /// Stop was requested
    Stopped,
    /// Task was cancelled before it could report; its counters are lost
    Cancelled,
}

/// Summary returned when a feed stops
#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    /// How the feed ended
    pub end: FeedEnd,
    /// What happened to the samples it received, all zero when
    /// [`FeedEnd::Cancelled`]
    pub stats: FeedStats,
}

/// Drives an estimator from a [`SampleSource`]
pub struct FeedAdapter<C: TimeSource, S: SampleSource> {
    writer: EstimatorWriter<C>,
    source: S,
    config: FeedConfig,
    stats: FeedStats,
}

impl<C, S> FeedAdapter<C, S>
where
    C: TimeSource + 'static,
    S: SampleSource + 'static,
{
    /// Adapter around an existing writer
    ///
    /// The writer's estimator keeps the tuning it was built with; only the
    /// timestamp policy of `config` applies.
    pub fn new(writer: EstimatorWriter<C>, source: S, config: FeedConfig) -> Self {
        Self {
            writer,
            source,
            config,
            stats: FeedStats::default(),
        }
    }

    /// Build the estimator from `config` and return a reader on it
    pub fn build(config: FeedConfig, clock: C, source: S) -> Result<(Self, EstimateReader), ConfigError> {
        let estimator = AltitudeEstimator::new(config.tuning, clock)?;
        let (writer, reader) = share(estimator);
        Ok((Self::new(writer, source, config), reader))
    }

    /// A new reader on the estimate this adapter drives
    pub fn reader(&self) -> EstimateReader {
        self.writer.reader()
    }

    /// Counters so far
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Run until the source ends or fails
    pub async fn run(self) -> FeedReport {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until the source ends, fails, or `shutdown` resolves
    ///
    /// A stop request takes effect between samples; a sample that has
    /// already been taken from the source is always processed.
    pub async fn run_until<F>(mut self, shutdown: F) -> FeedReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        log::debug!("sample feed started ({:?} timestamps)", self.config.clock);

        let end = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break FeedEnd::Stopped,
                next = self.source.next_sample() => match next {
                    Some(Ok(sample)) => self.process(sample),
                    Some(Err(error)) => {
                        log::warn!("sample source failed: {}", error);
                        break FeedEnd::SourceFailed(error);
                    }
                    None => break FeedEnd::Completed,
                },
            }
        };

        self.source.close();
        log::debug!(
            "sample feed ended: {:?} after {} samples ({} applied, {} rejected)",
            end,
            self.stats.received,
            self.stats.applied,
            self.stats.rejected
        );

        FeedReport {
            end,
            stats: self.stats,
        }
    }

    /// Run on the tokio runtime, returning a handle to stop or await it
    pub fn spawn(self) -> FeedHandle {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let shutdown = async move {
            // A dropped handle detaches the feed rather than stopping it
            if stop_rx.await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        FeedHandle {
            stop_tx,
            join: tokio::spawn(self.run_until(shutdown)),
        }
    }

    /// Forward one sample to the estimator
    fn process(&mut self, sample: AltitudeSample) {
        let result = self.apply(&sample);
        self.stats.record(&result);

        match result {
            Ok(outcome) => {
                let estimate = self.writer.estimator();
                match sample.pressure_hpa() {
                    Some(hpa) => log::debug!(
                        "altitude {:.2} m, vertical speed {:.2} m/s, baro {:.2} hPa ({})",
                        estimate.altitude(),
                        estimate.vertical_speed(),
                        hpa,
                        describe(&outcome)
                    ),
                    None => log::debug!(
                        "altitude {:.2} m, vertical speed {:.2} m/s ({})",
                        estimate.altitude(),
                        estimate.vertical_speed(),
                        describe(&outcome)
                    ),
                }
            }
            Err(error) => log::warn!("skipping sample at {} ms: {}", sample.timestamp, error),
        }
    }

    fn apply(&mut self, sample: &AltitudeSample) -> EstimatorResult<UpdateOutcome> {
        match self.config.clock {
            TimestampPolicy::Sample => self
                .writer
                .update_at(sample.relative_altitude_m, sample.timestamp),
            TimestampPolicy::Arrival => self.writer.update(sample.relative_altitude_m),
        }
    }
}

fn describe(outcome: &UpdateOutcome) -> &'static str {
    match outcome {
        UpdateOutcome::Corrected { .. } => "corrected",
        UpdateOutcome::Gated { .. } => "gated",
        UpdateOutcome::Degenerate { .. } => "degenerate",
    }
}

/// Handle to a spawned feed
///
/// Dropping the handle leaves the feed running until its source ends.
pub struct FeedHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<FeedReport>,
}

impl FeedHandle {
    /// Ask the feed to stop and wait for its report
    pub async fn stop(self) -> FeedReport {
        // Err means the feed already finished on its own
        let _ = self.stop_tx.send(());
        Self::wait(self.join).await
    }

    /// Wait for the feed to end on its own
    pub async fn join(self) -> FeedReport {
        Self::wait(self.join).await
    }

    /// Whether the feed task has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    async fn wait(join: JoinHandle<FeedReport>) -> FeedReport {
        match join.await {
            Ok(report) => report,
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => {
                log::warn!("sample feed task cancelled, feed stats unavailable: {}", error);
                FeedReport {
                    end: FeedEnd::Cancelled,
                    stats: FeedStats::default(),
                }
            }
        }
    }
}
