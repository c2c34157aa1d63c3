//! Upstream sample source interface
//!
//! The source supplies encoded access units and format changes. Reads are
//! non-blocking and tri-state: nothing available, a format change, or a
//! payload written into the caller's buffer.

use crate::audio::buffer::InputBuffer;
use crate::audio::types::AudioFormat;

/// Result of one source read
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// Nothing available this tick
    Nothing,
    /// The stream format changed (or was first determined); no payload was
    /// written
    Format(AudioFormat),
    /// A payload or end-of-stream marker was written into the buffer
    Buffer,
}

/// Supplier of encoded access units
pub trait SampleSource {
    /// Read the next item from the source
    ///
    /// With `Some(buffer)` the source may fill the buffer with a payload (or
    /// mark it end-of-stream) and return `Buffer`. With `None` the call is a
    /// format probe: only `Nothing` or `Format` may be returned.
    fn read(&mut self, buffer: Option<&mut InputBuffer>) -> ReadOutcome;

    /// Whether the source expects to be able to deliver data soon
    fn is_ready(&self) -> bool;
}
