//! Core audio data types
//!
//! Defines the immutable stream format description shared by the source,
//! decoder, and sink interfaces.

use serde::{Deserialize, Serialize};

/// PCM sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PcmEncoding {
    /// Signed 16-bit little-endian integer
    Pcm16,
    /// Signed 24-bit packed little-endian integer
    Pcm24,
    /// Signed 32-bit little-endian integer
    Pcm32,
    /// 32-bit little-endian float
    PcmFloat,
}

impl PcmEncoding {
    /// Bytes per sample for this encoding
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PcmEncoding::Pcm16 => 2,
            PcmEncoding::Pcm24 => 3,
            PcmEncoding::Pcm32 | PcmEncoding::PcmFloat => 4,
        }
    }
}

impl std::fmt::Display for PcmEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PcmEncoding::Pcm16 => write!(f, "pcm16"),
            PcmEncoding::Pcm24 => write!(f, "pcm24"),
            PcmEncoding::Pcm32 => write!(f, "pcm32"),
            PcmEncoding::PcmFloat => write!(f, "pcm_float"),
        }
    }
}

/// Description of one audio stream
///
/// Immutable: when the source signals a format change the renderer replaces
/// its held format wholesale rather than mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// MIME type of the samples (e.g. "audio/raw", "audio/opus")
    pub sample_mime_type: String,
    /// Channel count
    pub channel_count: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sample encoding of raw PCM payloads
    pub pcm_encoding: PcmEncoding,
}

/// MIME type for raw PCM audio
pub const MIME_AUDIO_RAW: &str = "audio/raw";

impl AudioFormat {
    /// Create a format description
    pub fn new(
        sample_mime_type: impl Into<String>,
        channel_count: u16,
        sample_rate: u32,
        pcm_encoding: PcmEncoding,
    ) -> Self {
        Self {
            sample_mime_type: sample_mime_type.into(),
            channel_count,
            sample_rate,
            pcm_encoding,
        }
    }

    /// 16-bit raw PCM at the given channel count and sample rate
    ///
    /// This is the default decoder output policy: decoders that do not
    /// derive their output format from decoded content produce 16-bit PCM
    /// matching the input's channel count and sample rate.
    pub fn pcm16(channel_count: u16, sample_rate: u32) -> Self {
        Self::new(MIME_AUDIO_RAW, channel_count, sample_rate, PcmEncoding::Pcm16)
    }

    /// Bytes per PCM frame (all channels of one sample instant)
    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        self.pcm_encoding.bytes_per_sample() * self.channel_count as usize
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}ch {}Hz {}",
            self.sample_mime_type, self.channel_count, self.sample_rate, self.pcm_encoding
        )
    }
}
