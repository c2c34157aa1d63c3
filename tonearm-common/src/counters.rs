//! Decoder activity counters
//!
//! Monotone tallies maintained by the render pipeline and read by external
//! reporting. The pipeline only ever increments; a full snapshot travels on
//! `RenderEvent::CountersSnapshot`.

use serde::{Deserialize, Serialize};

/// Running tallies for one decoder lifetime.
///
/// All fields are monotonically increasing for the life of the renderer;
/// they are never reset by flush or seek.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCounters {
    /// Number of decoder instances constructed
    pub decoder_init_count: u64,
    /// Number of decoder instances released
    pub decoder_release_count: u64,
    /// Encoded input buffers queued to the decoder
    pub input_buffer_count: u64,
    /// Decoded output buffers fully consumed by the sink
    pub rendered_output_buffer_count: u64,
    /// Decoded samples the decoder skipped rather than produced
    pub skipped_output_buffer_count: u64,
}

impl std::fmt::Display for DecoderCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "init={} release={} input={} rendered={} skipped={}",
            self.decoder_init_count,
            self.decoder_release_count,
            self.input_buffer_count,
            self.rendered_output_buffer_count,
            self.skipped_output_buffer_count
        )
    }
}
