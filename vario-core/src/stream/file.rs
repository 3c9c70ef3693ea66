//! CSV replay of recorded barometer sessions
//!
//! ## Format
//!
//! One sample per line, pressure optional:
//!
//! ```csv
//! timestamp_ms,relative_altitude_m,pressure_kpa
//! 1000,10.02,101.204
//! 2000,10.01
//! ```
//!
//! Blank lines and lines starting with `#` are skipped silently. Malformed
//! lines yield a `Format` error for that line only; the next poll continues
//! with the following line.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::sample::AltitudeSample;
use super::{Stream, StreamError};

/// Longest accepted line, in bytes
const MAX_LINE_LEN: usize = 128;

/// Statistics for a replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Samples parsed successfully
    pub samples_read: usize,
    /// Lines consumed, including skipped ones
    pub lines_processed: usize,
    /// Lines that failed to parse
    pub parse_errors: usize,
}

/// Stream of samples read from CSV
///
/// ```rust,no_run
/// use vario_core::Stream;
/// use vario_core::stream::CsvReplayStream;
///
/// let mut stream = CsvReplayStream::open("flight.csv")?.with_skip_lines(1);
/// while let Ok(sample) = stream.poll_next() {
///     println!("{} m at {} ms", sample.relative_altitude_m, sample.timestamp);
/// }
/// # Ok::<(), vario_core::stream::StreamError<std::io::Error>>(())
/// ```
pub struct CsvReplayStream<R: Read> {
    reader: BufReader<R>,
    line_buffer: heapless::String<MAX_LINE_LEN>,
    skip_lines: usize,
    lines_skipped: usize,
    eof: bool,
    stats: ReplayStats,
}

impl CsvReplayStream<File> {
    /// Open a CSV file for replay
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError<std::io::Error>> {
        let file = File::open(path).map_err(StreamError::Transport)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvReplayStream<R> {
    /// Replay from any reader
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_buffer: heapless::String::new(),
            skip_lines: 0,
            lines_skipped: 0,
            eof: false,
            stats: ReplayStats::default(),
        }
    }

    /// Skip first N lines (useful for headers)
    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Read the next line into the line buffer; false at EOF
    fn read_line(&mut self) -> Result<bool, StreamError<std::io::Error>> {
        self.line_buffer.clear();
        let mut overflowed = false;

        loop {
            let available = self.reader.fill_buf().map_err(StreamError::Transport)?;
            if available.is_empty() {
                if self.line_buffer.is_empty() && !overflowed {
                    return Ok(false);
                }
                break;
            }

            let (chunk, newline) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], true),
                None => (available, false),
            };

            for &byte in chunk {
                if byte != b'\r' && !overflowed && self.line_buffer.push(byte as char).is_err() {
                    overflowed = true;
                }
            }

            let consumed = chunk.len() + usize::from(newline);
            self.reader.consume(consumed);

            if newline {
                break;
            }
        }

        self.stats.lines_processed += 1;
        if overflowed {
            self.stats.parse_errors += 1;
            return Err(StreamError::Overflow);
        }
        Ok(true)
    }

    /// Parse the current line buffer
    fn parse_line(&self) -> Result<AltitudeSample, &'static str> {
        let mut fields = self.line_buffer.split(',').map(str::trim);

        let timestamp = fields
            .next()
            .and_then(|f| f.parse::<u64>().ok())
            .ok_or("Invalid timestamp")?;

        let altitude = fields
            .next()
            .and_then(|f| f.parse::<f64>().ok())
            .ok_or("Invalid altitude")?;

        let mut sample = AltitudeSample::new(timestamp, altitude);

        if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
            let pressure = field.parse::<f64>().map_err(|_| "Invalid pressure")?;
            sample = sample.with_pressure_kpa(pressure);
        }

        if fields.next().is_some() {
            return Err("Too many fields");
        }

        Ok(sample)
    }
}

impl<R: Read> Stream for CsvReplayStream<R> {
    type Item = AltitudeSample;
    type Error = StreamError<std::io::Error>;

    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error> {
        loop {
            if self.eof {
                return Err(nb::Error::Other(StreamError::EndOfStream));
            }

            if !self.read_line().map_err(nb::Error::Other)? {
                self.eof = true;
                continue;
            }

            if self.lines_skipped < self.skip_lines {
                self.lines_skipped += 1;
                continue;
            }

            let line = self.line_buffer.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            return match self.parse_line() {
                Ok(sample) => {
                    self.stats.samples_read += 1;
                    Ok(sample)
                }
                Err(reason) => {
                    self.stats.parse_errors += 1;
                    Err(nb::Error::Other(StreamError::Format(reason)))
                }
            };
        }
    }
}
