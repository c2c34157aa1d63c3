//! Audio data types and capability interfaces
//!
//! The renderer is generic over everything here: formats and buffers are
//! plain data, while decoders and sinks are trait objects supplied by the
//! embedding application.

pub mod buffer;
pub mod decoder;
pub mod sink;
pub mod types;

pub use buffer::{InputBuffer, OutputBuffer};
pub use decoder::{AudioDecoder, DecoderFactory};
pub use sink::{AudioSink, SessionId, SinkWriteStatus};
pub use types::{AudioFormat, PcmEncoding, MIME_AUDIO_RAW};
