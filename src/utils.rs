//! Shared utility functions

use std::time::{SystemTime, UNIX_EPOCH};

/// Normalize a raw localization confidence to a percentage in [0, 100].
///
/// Values in [0, 1] are read as probabilities and scaled by 100; anything else
/// is already a percentage or a raw match count and is clamped. The result is
/// rounded to one decimal. Every caller must go through this function so that
/// confidences are comparable regardless of where they came from.
#[inline]
pub fn normalize_confidence(raw: f32) -> f32 {
    if !raw.is_finite() {
        return 0.0;
    }
    let mut v = raw;
    if (0.0..=1.0).contains(&v) {
        v *= 100.0;
    }
    (v.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Exponential moving average step. `weight` is the share of the new sample.
#[inline]
pub fn smooth(previous: Option<f32>, sample: f32, weight: f32) -> f32 {
    match previous {
        Some(prev) => ((prev + weight * (sample - prev)) * 10.0).round() / 10.0,
        None => sample,
    }
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
