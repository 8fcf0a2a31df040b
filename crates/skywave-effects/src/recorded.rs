//! Playback over a shared recorded sample buffer.
//!
//! The noise beds (VHF/HF white noise, AC-bus hum, crackle) loop forever;
//! the squelch click plays its buffer once and ends. The underlying buffer
//! is shared and immutable, so any number of radios can play the same bed
//! at independent positions.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use skywave_core::{Frame, SampleSource, SourceStatus};

/// Plays a recorded sample buffer, either looping or one-shot.
#[derive(Debug, Clone)]
pub struct RecordedSampleSource {
    samples: Arc<[f32]>,
    position: usize,
    looping: bool,
}

impl RecordedSampleSource {
    /// Create a player over `samples`, starting at the beginning.
    ///
    /// With `looping` the source wraps at the end and never finishes;
    /// without it the last partial frame is zero-padded and the next pull
    /// reports [`SourceStatus::EndOfStream`].
    #[must_use]
    pub fn new(samples: Arc<[f32]>, looping: bool) -> Self {
        Self {
            samples,
            position: 0,
            looping,
        }
    }
}

impl SampleSource for RecordedSampleSource {
    fn get_frame(&mut self, out: &mut Frame) -> SourceStatus {
        let len = self.samples.len();
        if len == 0 || (!self.looping && self.position >= len) {
            return SourceStatus::EndOfStream;
        }

        if self.looping {
            for sample in out.iter_mut() {
                *sample = self.samples[self.position];
                self.position = (self.position + 1) % len;
            }
        } else {
            let remaining = len - self.position;
            let take = remaining.min(out.len());
            out[..take].copy_from_slice(&self.samples[self.position..self.position + take]);
            out[take..].fill(0.0);
            self.position += take;
        }
        SourceStatus::Ok
    }
}
