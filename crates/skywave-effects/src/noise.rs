//! Deterministic pink noise generator.
//!
//! White noise from a xorshift PRNG, pinked by Paul Kellet's filter. Fully
//! deterministic for a given seed, so two receivers configured alike render
//! identical noise.

use skywave_core::{Frame, SampleSource, SourceStatus};

const DEFAULT_SEED: u32 = 0x1d87_2b41;

/// Endless pink noise with roughly -3 dB/octave spectral slope.
#[derive(Debug, Clone)]
pub struct PinkNoiseGenerator {
    state: u32,
    b: [f32; 7],
}

impl PinkNoiseGenerator {
    /// Create a generator with the default seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Create a generator with an explicit non-zero seed.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            state: if seed == 0 { DEFAULT_SEED } else { seed },
            b: [0.0; 7],
        }
    }

    /// Next white-noise sample in [-1, 1).
    #[inline]
    fn white(&mut self) -> f32 {
        // xorshift32
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Next pink-noise sample.
    #[inline]
    fn pink(&mut self) -> f32 {
        let white = self.white();
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let pink = b.iter().sum::<f32>() + white * 0.5362;
        b[6] = white * 0.115926;
        pink * 0.11
    }
}

impl Default for PinkNoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for PinkNoiseGenerator {
    fn get_frame(&mut self, out: &mut Frame) -> SourceStatus {
        for sample in out.iter_mut() {
            *sample = self.pink();
        }
        SourceStatus::Ok
    }
}
