//! Audio output sink interface
//!
//! The sink owns the hardware or OS audio output. It accepts PCM via
//! `handle_buffer`, reports how much it still holds, and is the pipeline's
//! source of truth for playback position. `handle_buffer` is the one call
//! that may block briefly, since it paces real hardware; everything else
//! returns immediately.

use crate::audio::types::AudioFormat;
use crate::error::Result;

/// Device-level handle associating the output stream with platform audio
/// effect processing
pub type SessionId = u32;

/// Outcome of handing a buffer to the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkWriteStatus {
    /// The sink took the whole buffer; the caller may release it
    pub consumed: bool,
    /// The sink lost track of position (e.g. after an internal restart);
    /// the playback clock may jump backwards once
    pub position_discontinuity: bool,
}

/// An audio output device abstraction
pub trait AudioSink {
    /// Set the PCM format of subsequent buffers
    ///
    /// Fails with a sink-initialization error if the sink cannot accept the
    /// format; a decoder whose output format disagrees with what it actually
    /// produces is surfaced here rather than guessed around.
    fn configure(&mut self, format: &AudioFormat) -> Result<()>;

    /// Acquire the output device
    ///
    /// With `Some(id)` the sink joins the given audio session; with `None`
    /// it requests a fresh session from the platform. Returns the session
    /// id in effect.
    fn initialize(&mut self, session_id: Option<SessionId>) -> Result<SessionId>;

    /// Whether the sink currently holds an initialized device
    fn is_initialized(&self) -> bool;

    /// Whether the sink still holds unplayed data
    fn has_pending_data(&self) -> bool;

    /// Hand PCM to the sink
    ///
    /// Returns whether the buffer was fully consumed; a non-consumed result
    /// is backpressure, and the caller retries the same buffer next tick.
    fn handle_buffer(&mut self, data: &[u8], timestamp_us: i64) -> Result<SinkWriteStatus>;

    /// Signal that no further buffers will arrive for this stream
    fn handle_end_of_stream(&mut self);

    /// Current playback position in microseconds
    ///
    /// `ended` tells the sink the stream is known to be complete, letting it
    /// extrapolate to the end of its buffered data. `None` means the sink
    /// cannot report a position yet.
    fn position_us(&self, ended: bool) -> Option<i64>;

    /// Capacity of the sink's buffer in bytes
    fn buffer_size_bytes(&self) -> usize;

    /// Capacity of the sink's buffer as a duration, if known
    fn buffer_size_us(&self) -> Option<i64>;

    /// Begin or resume playing buffered data
    fn play(&mut self);

    /// Pause playback, retaining buffered data
    fn pause(&mut self);

    /// Drop buffered data and timing state, keeping the device
    ///
    /// After a reset the sink reports uninitialized and must be configured
    /// and initialized again before accepting buffers.
    fn reset(&mut self);

    /// Release the device entirely
    fn release(&mut self);

    /// Set output gain: 0.0 is silence, 1.0 is unity
    fn set_volume(&mut self, volume: f32);
}
