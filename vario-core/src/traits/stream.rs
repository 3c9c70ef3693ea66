//! Pull-Based Sample Streams
//!
//! Streams hand samples to a consumer that asks for them, using the `nb`
//! crate's non-blocking model. This suits bare-metal loops and replays where
//! there is no async runtime; push-based asynchronous sources are handled by
//! the feed adapter in `vario-connectors`.
//!
//! ```rust
//! use vario_core::traits::Stream;
//!
//! fn drain<S: Stream>(stream: &mut S) -> Result<usize, S::Error> {
//!     let mut count = 0;
//!     loop {
//!         match stream.poll_next() {
//!             Ok(_) => count += 1,
//!             Err(nb::Error::WouldBlock) => return Ok(count),
//!             Err(nb::Error::Other(e)) => return Err(e),
//!         }
//!     }
//! }
//! ```

/// Core stream trait for sample sources
///
/// ## Error Handling
///
/// Two-level error model:
/// - `nb::Error::WouldBlock` - no sample available yet, try again later
/// - `nb::Error::Other(e)` - stream error, including end of stream
///
/// `EndOfStream` must be sticky: once returned, every later poll returns it.
pub trait Stream {
    /// Type of items produced by the stream
    type Item;

    /// Type of errors that can occur
    type Error;

    /// Attempt to pull the next item from the stream
    ///
    /// Must not block indefinitely.
    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error>;

    /// Returns bounds on remaining items
    ///
    /// Same contract as `Iterator::size_hint()`. Live sensor streams are
    /// unbounded, hence the `(0, None)` default.
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
