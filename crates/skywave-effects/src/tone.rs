//! Continuous sine tone source.
//!
//! Used for the 180 Hz blocked-carrier beep a radio plays while two or more
//! stations transmit on the same frequency at once.

use core::f32::consts::TAU;
use libm::sinf;
use skywave_core::{Frame, SAMPLE_RATE_HZ, SampleSource, SourceStatus};

/// An endless sine tone at a fixed frequency.
#[derive(Debug, Clone)]
pub struct SineToneSource {
    /// Phase in turns, kept in [0, 1).
    phase: f32,
    /// Phase increment per sample in turns.
    phase_inc: f32,
}

impl SineToneSource {
    /// Create a tone source at `frequency_hz`.
    #[must_use]
    pub fn new(frequency_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: frequency_hz / SAMPLE_RATE_HZ as f32,
        }
    }
}

impl SampleSource for SineToneSource {
    fn get_frame(&mut self, out: &mut Frame) -> SourceStatus {
        for sample in out.iter_mut() {
            *sample = sinf(TAU * self.phase);
            self.phase += self.phase_inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
        SourceStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywave_core::silent_frame;

    #[test]
    fn test_never_ends() {
        let mut tone = SineToneSource::new(180.0);
        let mut frame = silent_frame();
        for _ in 0..100 {
            assert_eq!(tone.get_frame(&mut frame), SourceStatus::Ok);
        }
    }

    #[test]
    fn test_bounded_output() {
        let mut tone = SineToneSource::new(180.0);
        let mut frame = silent_frame();
        tone.get_frame(&mut frame);
        for &s in frame.iter() {
            assert!(s.abs() <= 1.0);
        }
    }

    #[test]
    fn test_180_hz_periodicity() {
        // 180 Hz at 48 kHz has a period of 266.67 samples; over a frame the
        // tone must cross zero going positive 3 or 4 times.
        let mut tone = SineToneSource::new(180.0);
        let mut frame = silent_frame();
        tone.get_frame(&mut frame);
        let crossings = frame
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count();
        assert!((3..=4).contains(&crossings), "got {} crossings", crossings);
    }

    #[test]
    fn test_phase_continuity_across_frames() {
        let mut tone = SineToneSource::new(180.0);
        let mut a = silent_frame();
        let mut b = silent_frame();
        tone.get_frame(&mut a);
        tone.get_frame(&mut b);
        // No discontinuity: the first sample of the second frame continues
        // the waveform within one sample step of the last of the first.
        let max_step = TAU * 180.0 / SAMPLE_RATE_HZ as f32;
        assert!((b[0] - a[a.len() - 1]).abs() <= max_step * 1.1);
    }
}
