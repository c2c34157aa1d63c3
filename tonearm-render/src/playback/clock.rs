//! Playback clock
//!
//! Derives a monotonic position signal from whatever the sink reports.
//! The position never moves backwards unless a discontinuity was explicitly
//! allowed (seek, sink restart), and then for exactly one advance.

/// Monotonic, discontinuity-aware playback position tracker
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    position_us: i64,
    allow_discontinuity: bool,
}

impl PlaybackClock {
    /// Clock starting at position zero with a discontinuity allowed, so the
    /// first valid sink report is adopted as-is
    pub fn new() -> Self {
        Self {
            position_us: 0,
            allow_discontinuity: true,
        }
    }

    /// Fold one sink position report into the tracked position
    ///
    /// `Some(v)` replaces the tracked position outright if a discontinuity
    /// is currently allowed (consuming the flag); otherwise the tracked
    /// position becomes `max(tracked, v)`. `None` leaves the tracked
    /// position untouched. Returns the tracked position.
    pub fn advance(&mut self, sink_position_us: Option<i64>) -> i64 {
        if let Some(new_position_us) = sink_position_us {
            self.position_us = if self.allow_discontinuity {
                new_position_us
            } else {
                self.position_us.max(new_position_us)
            };
            self.allow_discontinuity = false;
        }
        self.position_us
    }

    /// Rebase the clock to a new position and allow one backward jump
    pub fn reset_to(&mut self, position_us: i64) {
        self.position_us = position_us;
        self.allow_discontinuity = true;
    }

    /// Allow the next advance to move backwards once
    pub fn allow_discontinuity(&mut self) {
        self.allow_discontinuity = true;
    }

    /// Current tracked position without consulting the sink
    pub fn position_us(&self) -> i64 {
        self.position_us
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
