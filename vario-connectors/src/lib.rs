//! Sensor feeds for the Vario estimator
//!
//! ## Overview
//!
//! The acquisition layer (a platform barometer service, a serial port, a
//! replay tool) delivers altitude samples whenever the hardware produces
//! them. This crate bridges such a push-based source into the sequential
//! update calls the estimator expects.
//!
//! ```text
//! SampleSource ──next_sample()──▶ FeedAdapter ──update_at()──▶ EstimatorWriter
//!                                                                   │
//!                                        EstimateReader ◀── snapshot + notify
//! ```
//!
//! ## Guarantees
//!
//! - Samples are forwarded in arrival order, one at a time
//! - A sample is fully processed before the next one is awaited
//! - Nothing is dropped: upstream queueing is unbounded
//! - Non-finite samples are counted and skipped; the feed keeps running
//! - A source failure ends the feed without forwarding a partial sample
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vario_connectors::{channel, FeedAdapter, FeedConfig};
//! use vario_core::{AltitudeSample, MonotonicTime};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (publisher, source) = channel();
//! let (adapter, reader) = FeedAdapter::build(FeedConfig::default(), MonotonicTime::new(), source)?;
//!
//! reader.subscribe(|estimate| println!("{:.2} m, {:+.2} m/s", estimate.altitude, estimate.vertical_speed));
//! let handle = adapter.spawn();
//!
//! publisher.publish(AltitudeSample::new(1_000, 12.4).with_pressure_kpa(101.2))?;
//! drop(publisher);
//!
//! let report = handle.join().await;
//! println!("{:?}", report.end);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod channel;
pub mod config;

pub use adapter::{FeedAdapter, FeedEnd, FeedHandle, FeedReport};
pub use channel::{channel, ChannelSource, SamplePublisher};
pub use config::{ConfigError, FeedConfig, TimestampPolicy};
pub use vario_core::FeedStats;

use async_trait::async_trait;
use thiserror::Error;
use vario_core::AltitudeSample;

/// Upstream source errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The sensor is not present or not permitted on this device
    #[error("Sensor unavailable")]
    Unavailable,

    /// The source failed while delivering samples
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Push-based producer of altitude samples
///
/// `next_sample` resolves when the next sample arrives. `None` means the
/// source ended normally; an error ends it too, and no further samples are
/// expected afterwards. Implementations must be cancel safe: the adapter
/// may drop a pending `next_sample` future when asked to stop.
#[async_trait]
pub trait SampleSource: Send {
    /// Wait for the next sample
    async fn next_sample(&mut self) -> Option<Result<AltitudeSample, SourceError>>;

    /// Stop delivery and release the underlying sensor subscription
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_display() {
        assert_eq!(SourceError::Unavailable.to_string(), "Sensor unavailable");
        assert_eq!(
            SourceError::Delivery("altimeter reset".into()).to_string(),
            "Delivery failed: altimeter reset"
        );
    }
}
