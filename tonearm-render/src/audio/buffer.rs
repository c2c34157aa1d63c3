//! Input and output buffer types
//!
//! Buffers are owned values: queueing a buffer to the decoder or releasing
//! one back to it moves the value, so at most one side can ever hold a given
//! buffer. This replaces the pooled shared-reference model with move
//! semantics; a double release does not compile.

/// One encoded access unit on its way to the decoder
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    /// Encoded payload
    pub data: Vec<u8>,
    /// Presentation timestamp (microseconds)
    pub timestamp_us: i64,
    /// End-of-stream marker; an EOS buffer carries no payload
    pub end_of_stream: bool,
}

impl InputBuffer {
    /// Empty buffer ready for the source to fill
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear payload and flags so the buffer can be refilled
    pub fn clear(&mut self) {
        self.data.clear();
        self.timestamp_us = 0;
        self.end_of_stream = false;
    }
}

/// One decoded PCM buffer on its way to the sink
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    /// Decoded PCM payload
    pub data: Vec<u8>,
    /// Presentation timestamp (microseconds)
    pub timestamp_us: i64,
    /// End-of-stream marker; set on the final (empty) buffer
    pub end_of_stream: bool,
    /// Samples the decoder skipped rather than decoded while producing
    /// this buffer
    pub skipped_count: u64,
}

impl OutputBuffer {
    /// End-of-stream marker buffer
    pub fn end_of_stream() -> Self {
        Self {
            end_of_stream: true,
            ..Self::default()
        }
    }
}
