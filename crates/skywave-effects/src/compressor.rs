//! Soft-knee dynamics compressor for the receive chain.
//!
//! Runs directly after the band filter on every active radio channel,
//! flattening the level differences between near and far transmitters the
//! way a transmitter speech processor would.

use skywave_core::{Effect, EnvelopeFollower, db_to_linear, linear_to_db};

/// Compressor tuning.
///
/// The defaults are the radio chain's fixed settings: unity pre-gain,
/// -24 dB threshold, 12 dB knee, 30:1 ratio, 3 ms attack, 6 ms release.
#[derive(Debug, Clone, Copy)]
pub struct CompressorParams {
    /// Linear gain applied before detection and compression.
    pub pre_gain: f32,
    /// Threshold in dB below full scale.
    pub threshold_db: f32,
    /// Knee width in dB, centred on the threshold.
    pub knee_db: f32,
    /// Compression ratio (30.0 means 30:1).
    pub ratio: f32,
    /// Envelope attack time in milliseconds.
    pub attack_ms: f32,
    /// Envelope release time in milliseconds.
    pub release_ms: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            pre_gain: 1.0,
            threshold_db: -24.0,
            knee_db: 12.0,
            ratio: 30.0,
            attack_ms: 3.0,
            release_ms: 6.0,
        }
    }
}

/// Soft-knee compressor: envelope follower feeding a gain computer.
#[derive(Debug, Clone)]
pub struct SimpleCompressor {
    envelope: EnvelopeFollower,
    pre_gain: f32,
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
}

impl SimpleCompressor {
    /// Create a compressor with the radio chain's default parameters.
    #[must_use]
    pub fn new(sample_rate: f32) -> Self {
        Self::with_params(sample_rate, CompressorParams::default())
    }

    /// Create a compressor with explicit parameters.
    #[must_use]
    pub fn with_params(sample_rate: f32, params: CompressorParams) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(
                sample_rate,
                params.attack_ms.max(0.1),
                params.release_ms.max(0.1),
            ),
            pre_gain: params.pre_gain,
            threshold_db: params.threshold_db.clamp(-60.0, 0.0),
            knee_db: params.knee_db.clamp(0.0, 24.0),
            ratio: params.ratio.clamp(1.0, 100.0),
        }
    }

    /// Gain reduction in dB for a detected level, with a quadratic knee.
    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;

        if overshoot <= -self.knee_db / 2.0 {
            0.0
        } else if overshoot > self.knee_db / 2.0 {
            -(overshoot * (1.0 - 1.0 / self.ratio))
        } else {
            let knee_factor = (overshoot + self.knee_db / 2.0) / self.knee_db;
            -(knee_factor * knee_factor * overshoot * (1.0 - 1.0 / self.ratio))
        }
    }
}

impl Effect for SimpleCompressor {
    fn process(&mut self, input: f32) -> f32 {
        let staged = input * self.pre_gain;
        let envelope = self.envelope.process(staged);
        let envelope_db = linear_to_db(envelope);
        let gain_reduction_db = self.compute_gain_db(envelope_db);

        staged * db_to_linear(gain_reduction_db)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_finite() {
        let mut comp = SimpleCompressor::new(48000.0);
        for _ in 0..1000 {
            let out = comp.process(0.8);
            assert!(out.is_finite());
        }
    }

    #[test]
    fn test_compresses_hot_signal() {
        let mut comp = SimpleCompressor::new(48000.0);
        let mut out = 0.0;
        for _ in 0..4800 {
            out = comp.process(1.0);
        }
        // 0 dBFS input sits 24 dB over threshold at 30:1; expect heavy
        // reduction towards the threshold.
        assert!(out < 0.15, "expected heavy gain reduction, got {}", out);
        assert!(out > 0.0);
    }

    #[test]
    fn test_below_threshold_untouched() {
        let mut comp = SimpleCompressor::new(48000.0);
        let quiet = db_to_linear(-40.0);
        let mut out = 0.0;
        for _ in 0..4800 {
            out = comp.process(quiet);
        }
        // -40 dB is below threshold and knee; gain stays unity.
        assert!((out - quiet).abs() < quiet * 0.05);
    }

    #[test]
    fn test_reset_clears_envelope() {
        let mut comp = SimpleCompressor::new(48000.0);
        for _ in 0..1000 {
            comp.process(1.0);
        }
        comp.reset();
        let quiet = db_to_linear(-40.0);
        // After reset a quiet signal must not be ducked by leftover envelope.
        let out = comp.process(quiet);
        assert!((out - quiet).abs() < quiet * 0.2);
    }
}
