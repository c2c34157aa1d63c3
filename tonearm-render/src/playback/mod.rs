//! Render loop, playback clock, and source interface

pub mod clock;
pub mod renderer;
pub mod source;

pub use clock::PlaybackClock;
pub use renderer::{AudioRenderer, RendererMessage, RendererState, SessionHook};
pub use source::{ReadOutcome, SampleSource};
