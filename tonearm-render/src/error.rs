//! Error types for tonearm-render
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Backpressure (no decoder slot free, no output ready, sink
//! not accepting data) is never an error; these cover genuine failures that
//! abort the current render tick.

use thiserror::Error;

/// Main error type for the render pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Decoder construction failed in the factory
    #[error("Decoder construction failed: {0}")]
    DecoderInit(String),

    /// Decoder queue/dequeue operation failed
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// Audio sink configure/initialize failed
    #[error("Sink initialization error: {0}")]
    SinkInit(String),

    /// Audio sink rejected or failed a buffer write
    #[error("Sink write error: {0}")]
    SinkWrite(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using the render pipeline Error
pub type Result<T> = std::result::Result<T, Error>;

/// A render failure tagged with the identity of the renderer that raised it
///
/// The host's playback-error channel receives these; it is expected to halt
/// or fail over playback. The pipeline itself never retries.
#[derive(Error, Debug)]
#[error("Renderer {index} failed: {source}")]
pub struct PlaybackError {
    /// Index of the failing renderer within the host's renderer set
    pub index: usize,
    /// The underlying failure
    #[source]
    pub source: Error,
}

impl PlaybackError {
    /// Wrap an error with the identity of the renderer that raised it
    pub fn for_renderer(index: usize, source: Error) -> Self {
        Self { index, source }
    }
}
