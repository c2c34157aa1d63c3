//! Microsecond and frame timing helpers
//!
//! The pipeline tracks playback position in microseconds; sinks and tests
//! convert between microseconds, milliseconds, and PCM frame counts.

/// Microseconds per second
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Microseconds per millisecond
pub const MICROS_PER_MILLI: i64 = 1_000;

/// Convert microseconds to whole milliseconds (truncating)
#[inline]
pub fn us_to_ms(us: i64) -> i64 {
    us / MICROS_PER_MILLI
}

/// Convert milliseconds to microseconds
#[inline]
pub fn ms_to_us(ms: i64) -> i64 {
    ms * MICROS_PER_MILLI
}

/// Duration in microseconds of `frames` PCM frames at `sample_rate` Hz
#[inline]
pub fn frames_to_us(frames: u64, sample_rate: u32) -> i64 {
    (frames as i64 * MICROS_PER_SECOND) / sample_rate as i64
}

/// Number of whole PCM frames covering `us` microseconds at `sample_rate` Hz
#[inline]
pub fn us_to_frames(us: i64, sample_rate: u32) -> u64 {
    ((us * sample_rate as i64) / MICROS_PER_SECOND).max(0) as u64
}
