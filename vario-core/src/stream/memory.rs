//! Memory-based streams for testing and replay

use crate::sample::AltitudeSample;
use super::{Stream, StreamError};

/// Stream over a slice of samples
///
/// ## Example
///
/// ```rust
/// use vario_core::{AltitudeSample, Stream};
/// use vario_core::stream::MemoryStream;
///
/// let samples = [
///     AltitudeSample::new(1000, 10.02),
///     AltitudeSample::new(2000, 10.01),
/// ];
///
/// let mut stream = MemoryStream::new(&samples);
/// while let Ok(sample) = stream.poll_next() {
///     // Process sample
/// }
/// ```
pub struct MemoryStream<'a> {
    samples: &'a [AltitudeSample],
    position: usize,
}

impl<'a> MemoryStream<'a> {
    /// Create new memory stream from slice
    pub fn new(samples: &'a [AltitudeSample]) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Reset to beginning
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Get current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Check if stream is exhausted
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl<'a> Stream for MemoryStream<'a> {
    type Item = AltitudeSample;
    type Error = StreamError<()>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        let sample = self
            .samples
            .get(self.position)
            .copied()
            .ok_or(nb::Error::Other(StreamError::EndOfStream))?;

        self.position += 1;
        Ok(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}
