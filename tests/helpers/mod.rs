//! Test helpers for ostinato integration tests.
//!
//! All engines are offline: audio assertions pump the net backend through
//! `AudioContext::render`, so nothing here needs an audio device.

pub mod tolerances;

use ostinato::prelude::*;

/// Default test sample rate.
pub const TEST_SAMPLE_RATE: f64 = 48_000.0;

/// Create an offline test engine.
pub fn test_engine() -> OstinatoEngine {
    OstinatoEngine::builder()
        .offline(TEST_SAMPLE_RATE)
        .build()
        .expect("failed to create test engine")
}

/// RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
}

/// Whether every sample is below the threshold.
pub fn is_silent(samples: &[f32], threshold: f32) -> bool {
    peak(samples) < threshold
}

/// RMS of the window `[start, end)` in seconds of a rendered channel.
pub fn window_rms(samples: &[f32], sample_rate: f64, start: f64, end: f64) -> f32 {
    let lo = ((start * sample_rate) as usize).min(samples.len());
    let hi = ((end * sample_rate) as usize).min(samples.len());
    rms(&samples[lo..hi])
}
