//! Decoder capability interface
//!
//! The renderer drives any codec through this non-blocking poll/push
//! contract. A decoder may be internally concurrent (e.g. backed by a worker
//! thread) but its interface never blocks: a dequeue that returns `None`
//! means "try again next tick", not failure.

use crate::audio::buffer::{InputBuffer, OutputBuffer};
use crate::audio::types::AudioFormat;
use crate::error::Result;

/// A stateful audio decoder
///
/// Buffer ownership moves across this boundary in both directions: the
/// renderer takes buffers with the dequeue calls and gives them back with
/// `queue_input_buffer` / `release_output_buffer`. The renderer holds at
/// most one input and one output buffer at a time.
pub trait AudioDecoder {
    /// Implementation name, for event reporting and logs
    fn name(&self) -> &str;

    /// Take an empty input buffer to fill, if the decoder has one free
    ///
    /// `None` means every input slot is in flight; normal backpressure.
    fn dequeue_input_buffer(&mut self) -> Result<Option<InputBuffer>>;

    /// Hand a filled (or EOS-flagged) input buffer to the decoder
    fn queue_input_buffer(&mut self, buffer: InputBuffer) -> Result<()>;

    /// Take the next decoded buffer, if one is ready
    ///
    /// Output order follows presentation order, which may differ from feed
    /// order. `None` means the decoder is still working; normal
    /// backpressure.
    fn dequeue_output_buffer(&mut self) -> Result<Option<OutputBuffer>>;

    /// Return a consumed output buffer to the decoder's pool
    fn release_output_buffer(&mut self, buffer: OutputBuffer);

    /// Discard all in-flight state, keeping the decoder's configuration
    ///
    /// After a flush the decoder accepts fresh input immediately. A decoder
    /// left broken by flush reports the failure from its next dequeue.
    fn flush(&mut self);

    /// Format of the buffers this decoder outputs
    ///
    /// Not called until the first output buffer has been dequeued, so a
    /// decoder may use decoded content to determine its output format. The
    /// default is 16-bit PCM at the input's channel count and sample rate.
    fn output_format(&self, input: &AudioFormat) -> AudioFormat {
        AudioFormat::pcm16(input.channel_count, input.sample_rate)
    }
}

/// Constructs a decoder for a given input format
///
/// The factory is the codec-specific plug point: each codec backend supplies
/// one, and the renderer calls it lazily once the stream format is known.
pub trait DecoderFactory {
    /// Create a decoder for `format`
    ///
    /// A failure here is fatal to the render tick that requested it.
    fn create(&mut self, format: &AudioFormat) -> Result<Box<dyn AudioDecoder>>;
}
