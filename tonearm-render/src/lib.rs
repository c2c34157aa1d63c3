//! # Tonearm Render Pipeline (tonearm-render)
//!
//! The audio leg of a media playback pipeline: pulls encoded access units
//! from an upstream source, drives a pluggable decoder to PCM, feeds the PCM
//! to an audio output sink, and tracks playback position.
//!
//! **Architecture:** single-threaded cooperative render loop, driven once
//! per host scheduler tick. Sources, decoders, and sinks plug in behind
//! capability traits; buffer ownership moves across those seams so the
//! renderer can never double-release or share a buffer.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod sim;

pub use error::{Error, PlaybackError, Result};
pub use playback::{AudioRenderer, RendererMessage, RendererState};
