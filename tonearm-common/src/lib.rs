//! # Tonearm Common Library
//!
//! Shared code for the tonearm audio pipeline:
//! - Render event types (`RenderEvent` enum) and the `EventBus`
//! - Decoder counter tallies (`DecoderCounters`)
//! - Microsecond/frame timing helpers

pub mod counters;
pub mod events;
pub mod timing;

pub use counters::DecoderCounters;
pub use events::{EventBus, RenderEvent};
