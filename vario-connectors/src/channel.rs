//! In-process sample channel
//!
//! Lets a sensor callback on any thread push samples to a feed adapter.
//! The queue is unbounded so a slow estimator never causes samples to be
//! dropped. Dropping every publisher ends the stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use vario_core::AltitudeSample;

use crate::{SampleSource, SourceError};

enum Delivery {
    Sample(AltitudeSample),
    Failure(SourceError),
}

/// Create a connected publisher/source pair
pub fn channel() -> (SamplePublisher, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SamplePublisher { tx }, ChannelSource { rx, finished: false })
}

/// Producer half, usable from sync and async code alike
#[derive(Clone)]
pub struct SamplePublisher {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl SamplePublisher {
    /// Queue a sample
    ///
    /// Fails with [`SourceError::Unavailable`] once the source side has been
    /// closed or dropped.
    pub fn publish(&self, sample: AltitudeSample) -> Result<(), SourceError> {
        self.tx
            .send(Delivery::Sample(sample))
            .map_err(|_| SourceError::Unavailable)
    }

    /// End the stream with an error after the samples already queued
    pub fn fail(self, error: SourceError) {
        if self.tx.send(Delivery::Failure(error)).is_err() {
            log::debug!("sample source already closed, dropping failure");
        }
    }

    /// Whether the source side is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, fed to a [`crate::FeedAdapter`]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Delivery>,
    finished: bool,
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn next_sample(&mut self) -> Option<Result<AltitudeSample, SourceError>> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(Delivery::Sample(sample)) => Some(Ok(sample)),
            Some(Delivery::Failure(error)) => {
                self.close();
                Some(Err(error))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    fn close(&mut self) {
        self.finished = true;
        self.rx.close();
    }
}
