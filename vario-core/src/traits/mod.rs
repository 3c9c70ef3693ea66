//! Core Traits for Vario
//!
//! Extension points the estimator and its sample feeds are built on.
//!
//! ## Module Organization
//!
//! - [`time`] - Clock abstraction used to measure the interval between cycles
//! - [`stream`] - Pull-based sample streams for replay and embedded feeds
//! - [`sink`] - Measurement consumers that feeds forward samples into
//!
//! The push-based asynchronous source contract lives in `vario-connectors`
//! alongside its tokio runtime.

pub mod sink;
pub mod stream;
pub mod time;

pub use sink::SampleSink;
pub use stream::Stream;
pub use time::TimeSource;
