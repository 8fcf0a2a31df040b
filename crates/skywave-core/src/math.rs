//! Level-conversion and clipping helpers.
//!
//! Allocation-free math used across the stack: dB conversions for the
//! compressor and VU meter, and hard clipping for the channel limiter and
//! the microphone path.

use libm::{expf, logf};

/// Convert decibels to linear gain (0 dB -> 1.0, -6 dB -> ~0.5).
#[inline]
#[must_use]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs at or below zero are floored to
/// avoid -inf.
#[inline]
#[must_use]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Hard clip to the `[-threshold, threshold]` range.
#[inline]
#[must_use]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}
