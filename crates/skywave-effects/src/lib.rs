//! Radio artefact effects for the skywave receive chain.
//!
//! Everything a simulated radio adds on top of the decoded voice lives here:
//!
//! - [`VhfBandFilter`] - the fixed 7-section biquad cascade that narrows
//!   voice to the telephone bandwidth of an airband receiver
//! - [`SimpleCompressor`] - the soft-knee compressor that flattens dynamics
//!   the way a transmitter's speech processor does
//! - [`RecordedSampleSource`] - looping or one-shot playback of the recorded
//!   beds (white noise, AC-bus hum, crackle) and the squelch click
//! - [`SineToneSource`] - the endless blocked-carrier beep
//! - [`PinkNoiseGenerator`] - deterministic pink noise
//!
//! All sources produce one frame per pull and never block; the filter and
//! compressor transform frames in place. See `skywave-core` for the traits.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod compressor;
pub mod noise;
pub mod recorded;
pub mod tone;
pub mod vhf;

pub use compressor::{CompressorParams, SimpleCompressor};
pub use noise::PinkNoiseGenerator;
pub use recorded::RecordedSampleSource;
pub use tone::SineToneSource;
pub use vhf::VhfBandFilter;
