//! Airband receiver bandwidth filter.
//!
//! A cascade of seven fixed biquad sections shaping decoded voice into the
//! telephone-bandwidth spectrum of a VHF airband radio. The coefficient
//! table is tuned for 48 kHz and reproduced digit-for-digit; each row is
//! `(a0, a1, a2, b0, b1, b2)` with `a0 = 1` (the first section is a plain
//! attenuator/inverter that sets the cascade's level).

use skywave_core::{Biquad, Effect};

/// Levels the cascade back to roughly unity in the voice passband; the raw
/// sections sum to about +26 dB between 300 Hz and 2.5 kHz.
const OUTPUT_GAIN: f32 = 0.05;

/// Coefficient table, one row per section: `(a0, a1, a2, b0, b1, b2)`.
const SECTIONS: [[f64; 6]; 7] = [
    [1.0, 0.0, 0.0, -0.01, 0.0, 0.0],
    [1.0, -1.7152995098277, 0.761385315196423, 0.0, 1.0, 0.753162969638192],
    [1.0, -1.71626681678914, 0.762433947105989, 1.0, -2.29278115712509, 1.00033663293577],
    [1.0, -1.79384214686345, 0.909678364879526, 1.0, -2.05042803669041, 1.05048374237779],
    [1.0, -1.79409285259567, 0.909822671281377, 1.0, -1.95188929743297, 0.951942325888074],
    [1.0, -1.9390093095185, 0.9411847259142, 1.0, -1.82547932903698, 1.09157529229851],
    [1.0, -1.94022767750807, 0.942630574503006, 1.0, -1.67241244173042, 0.916184578658119],
];

/// The 7-section band-limiting cascade applied to every received voice
/// channel before compression.
///
/// Coefficients are fixed for 48 kHz operation; `set_sample_rate` is a
/// no-op because the rest of the stack only runs at that rate.
#[derive(Debug, Clone)]
pub struct VhfBandFilter {
    sections: [Biquad; 7],
}

impl VhfBandFilter {
    /// Build the cascade from the fixed coefficient table.
    #[must_use]
    pub fn new() -> Self {
        let sections = SECTIONS.map(|[a0, a1, a2, b0, b1, b2]| {
            Biquad::from_coefficients(
                b0 as f32, b1 as f32, b2 as f32, a0 as f32, a1 as f32, a2 as f32,
            )
        });
        Self { sections }
    }
}

impl Default for VhfBandFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for VhfBandFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let filtered = self
            .sections
            .iter_mut()
            .fold(input, |sample, section| section.process(sample));
        filtered * OUTPUT_GAIN
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
    }
}
