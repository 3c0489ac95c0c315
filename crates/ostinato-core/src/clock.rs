//! Sample clock shared between the control thread and the audio thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic sample clock.
///
/// Counts frames processed since the context started rendering. Whichever
/// side drives the graph (the CPAL callback or an offline render loop)
/// advances the clock one frame at a time, so readers observe sample-exact
/// time. All scheduling in the host is expressed against this clock.
pub struct AudioClock {
    frames: AtomicU64,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            frames: AtomicU64::new(0),
            sample_rate,
        }
    }

    /// Frames processed so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Current time in seconds on the audio timeline.
    #[inline]
    pub fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }

    /// Advance the clock. Called once per rendered frame.
    #[inline]
    pub fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Convert a time in seconds to an absolute frame number, never in the
    /// past. Times of zero (or earlier than the current clock) mean "now".
    pub fn frame_at(&self, time: f64) -> u64 {
        let frame = (time * self.sample_rate).round();
        let frame = if frame.is_finite() && frame > 0.0 {
            frame as u64
        } else {
            0
        };
        frame.max(self.frames())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let clock = AudioClock::new(48_000.0);
        assert_eq!(clock.frames(), 0);
        assert_eq!(clock.now(), 0.0);

        clock.advance(48_000);
        assert_eq!(clock.frames(), 48_000);
        approx::assert_abs_diff_eq!(clock.now(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_at_clamps_past_times() {
        let clock = AudioClock::new(1000.0);
        clock.advance(500);

        // Past and zero times resolve to "now".
        assert_eq!(clock.frame_at(0.0), 500);
        assert_eq!(clock.frame_at(0.25), 500);
        assert_eq!(clock.frame_at(-1.0), 500);

        // Future times are exact.
        assert_eq!(clock.frame_at(0.75), 750);
    }
}
