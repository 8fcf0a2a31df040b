//! Microphone input path state.
//!
//! One frame of microphone samples arrives per audio callback. It is run
//! through the optional preprocessor, scaled by the microphone volume and
//! hard-clipped, metered, and - while push-to-talk is engaged - handed to
//! the encoder for packet assembly. The metering and gating logic lives in
//! [`crate::mixer::RadioMixer::put_audio_frame`]; this module holds the
//! state it operates on.

use crate::codec::FrameEncoder;
use skywave_core::{FRAME_LENGTH_MS, Frame, RollingAverage, linear_to_db, peak};

/// VU meter floor in dB; frames quieter than this read as zero.
pub(crate) const VU_MIN_DB: f64 = -40.0;

/// VU meter ceiling in dB.
pub(crate) const VU_MAX_DB: f64 = 0.0;

/// The VU window is 300 ms of 20 ms frames.
pub(crate) const VU_WINDOW_FRAMES: usize = 300 / FRAME_LENGTH_MS as usize;

/// Optional voice-activity / denoise stage ahead of the encoder.
///
/// Implementations transform the frame in place and must be non-blocking;
/// they run on the audio thread.
pub trait FramePreprocessor: Send {
    /// Transform one microphone frame in place.
    fn process_frame(&mut self, frame: &mut Frame);
}

/// Mutable state of the microphone-to-network path.
pub(crate) struct InputPath {
    pub(crate) mic_volume: f32,
    pub(crate) vu_meter: RollingAverage,
    pub(crate) preprocessor: Option<Box<dyn FramePreprocessor>>,
    pub(crate) encoder: Box<dyn FrameEncoder>,
}

impl InputPath {
    pub(crate) fn new(encoder: Box<dyn FrameEncoder>, mic_volume: f32) -> Self {
        Self {
            mic_volume,
            vu_meter: RollingAverage::new(VU_WINDOW_FRAMES),
            preprocessor: None,
            encoder,
        }
    }
}

/// Map a frame's peak to the meter's [0, 1] ratio.
///
/// The peak in dB is clamped to `[-40, 0]` and normalized; ratios under
/// 0.30 are pinned to zero so the meter ignores room noise.
pub(crate) fn peak_ratio(samples: &[f32]) -> f64 {
    let peak_db = f64::from(linear_to_db(peak(samples))).clamp(VU_MIN_DB, VU_MAX_DB);
    let ratio = (peak_db - VU_MIN_DB) / (VU_MAX_DB - VU_MIN_DB);
    if ratio < 0.30 { 0.0 } else { ratio.min(1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywave_core::db_to_linear;

    #[test]
    fn test_window_is_300ms() {
        assert_eq!(VU_WINDOW_FRAMES, 15);
    }

    #[test]
    fn test_silence_reads_zero() {
        assert_eq!(peak_ratio(&[0.0; 32]), 0.0);
    }

    #[test]
    fn test_full_scale_reads_one() {
        let mut frame = [0.0; 32];
        frame[7] = 1.0;
        assert!((peak_ratio(&frame) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quiet_frames_are_pinned_to_zero() {
        // -30 dB maps to ratio 0.25, which is under the 0.30 pin.
        let frame = [db_to_linear(-30.0); 32];
        assert_eq!(peak_ratio(&frame), 0.0);
    }

    #[test]
    fn test_moderate_level_maps_linearly() {
        // -10 dB maps to (−10 − −40) / 40 = 0.75.
        let frame = [db_to_linear(-10.0); 32];
        assert!((peak_ratio(&frame) - 0.75).abs() < 1e-3);
    }

    #[test]
    fn test_hot_input_saturates_at_one() {
        let frame = [2.0; 32];
        assert!((peak_ratio(&frame) - 1.0).abs() < 1e-9);
    }
}
