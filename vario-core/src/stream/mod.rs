//! Pull-based sample streams
//!
//! - Core error type (this file)
//! - `memory` - In-memory streams for tests and replay
//! - `file` - CSV replay of recorded sessions (requires `std`)

use core::fmt;

pub mod memory;

#[cfg(feature = "std")]
pub mod file;

pub use memory::MemoryStream;

#[cfg(feature = "std")]
pub use file::{CsvReplayStream, ReplayStats};

/// Errors that can occur while pulling samples
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError<E> {
    /// Transport-level error (e.g., I/O error)
    Transport(E),
    /// Data format error
    Format(&'static str),
    /// End of stream reached
    EndOfStream,
    /// Buffer overflow
    Overflow,
}

impl<E> StreamError<E> {
    /// Whether the stream can still yield samples after this error
    ///
    /// Format and overflow errors skip one bad record; everything else ends the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Overflow)
    }
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Format(msg) => write!(f, "Format error: {}", msg),
            Self::EndOfStream => write!(f, "End of stream"),
            Self::Overflow => write!(f, "Buffer overflow"),
        }
    }
}

pub use crate::traits::Stream;
