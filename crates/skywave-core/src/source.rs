//! The pull-based sample producer trait.
//!
//! Everything that feeds audio into a radio channel - decoded voice streams,
//! the recorded noise beds, the blocked-carrier tone, the squelch click -
//! implements [`SampleSource`]: a non-blocking producer handing out exactly
//! one frame per call.

use crate::frame::Frame;

/// Outcome of a single frame pull from a [`SampleSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// A full frame was written to the output buffer.
    Ok,
    /// The source is exhausted; the buffer was not filled. One-shot sources
    /// (the click) report this once their buffer has played out, and voice
    /// streams report it after the end-of-transmission marker drains.
    EndOfStream,
    /// The source is still live but has nothing for this tick; the caller
    /// must treat it as silent. Voice streams report this when the network
    /// has not yet delivered the next packet.
    NoData,
}

/// A non-blocking producer of audio frames.
///
/// Implementations must be deterministic and must not block or allocate in
/// [`get_frame`](SampleSource::get_frame): it is called from the audio
/// callback. A source that returned [`SourceStatus::EndOfStream`] may keep
/// returning it; callers drop the source on the first non-`Ok` status.
pub trait SampleSource {
    /// Produce the next frame into `out`.
    ///
    /// On any status other than [`SourceStatus::Ok`] the contents of `out`
    /// are unspecified and must not be mixed.
    fn get_frame(&mut self, out: &mut Frame) -> SourceStatus;
}
