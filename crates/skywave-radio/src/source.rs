//! Per-callsign remote voice streams.
//!
//! Each remote talker gets a [`RemoteVoiceSource`]: a queue of compressed
//! payloads appended by the network thread and drained one decoded frame at
//! a time by the mixer. The source tracks when it last heard from the
//! network (for idle eviction) and whether the talker has signalled
//! end-of-transmission.
//!
//! Both sides run under the stream-map lock, so the source itself needs no
//! interior synchronization.

use crate::codec::FrameDecoder;
use crate::dto::{AudioReceived, RxTransceiver};
use skywave_core::{Frame, SourceStatus, silent_frame};
use std::collections::VecDeque;
use std::time::Instant;

/// A lazy, restartable sequence of decoded voice frames from one callsign.
///
/// Frames come out in packet-receipt order; the source never reorders by
/// sequence number. Gaps are the decoder's problem (it conceals them), and
/// a failed decode is reported as [`SourceStatus::NoData`] for that tick so
/// a single bad frame cannot kill the stream.
pub struct RemoteVoiceSource {
    queue: VecDeque<Vec<u8>>,
    decoder: Box<dyn FrameDecoder>,
    last_activity: Instant,
    /// The talker sent `LastPacket`; the stream ends once the queue drains.
    end_pending: bool,
    /// The end sentinel has drained; the source is inactive until the
    /// callsign keys up again.
    ended: bool,
}

impl RemoteVoiceSource {
    /// Create a source around a fresh decoder.
    #[must_use]
    pub fn new(decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            queue: VecDeque::new(),
            decoder,
            last_activity: Instant::now(),
            end_pending: false,
            ended: false,
        }
    }

    /// Append one received packet's payload. Runs on the network thread
    /// under the stream-map lock.
    pub fn append_packet(&mut self, packet: &AudioReceived, now: Instant) {
        self.queue.push_back(packet.audio.clone());
        self.end_pending = packet.last_packet;
        // A new packet after end-of-stream restarts the source.
        self.ended = false;
        self.last_activity = now;
    }

    /// Produce the next decoded frame. Runs on the audio thread under the
    /// stream-map lock.
    pub fn get_frame(&mut self, out: &mut Frame) -> SourceStatus {
        if self.ended {
            return SourceStatus::EndOfStream;
        }
        match self.queue.pop_front() {
            Some(payload) => match self.decoder.decode(Some(&payload), out) {
                Ok(()) => SourceStatus::Ok,
                Err(error) => {
                    tracing::debug!(%error, "codec failed on a frame; treating as missing");
                    SourceStatus::NoData
                }
            },
            None if self.end_pending => {
                self.ended = true;
                SourceStatus::EndOfStream
            }
            None => SourceStatus::NoData,
        }
    }

    /// False once the end-of-transmission sentinel has drained.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.ended
    }

    /// Monotonic timestamp of the last appended packet.
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}

/// Stream-map entry: one active remote talker on one output destination.
///
/// Holds the voice source, the transceiver set from the most recent packet
/// (replaced, never accumulated), and the per-tick fetch cache the mixer
/// fills during source prefetch.
pub(crate) struct CallsignMeta {
    pub(crate) source: RemoteVoiceSource,
    pub(crate) transceivers: Vec<RxTransceiver>,
    /// Decoded frame for the current mixing tick, valid while `fetch_valid`.
    pub(crate) fetch: Frame,
    pub(crate) fetch_valid: bool,
    /// Matched at least one radio during the current tick.
    pub(crate) audible: bool,
}

impl CallsignMeta {
    pub(crate) fn new(decoder: Box<dyn FrameDecoder>) -> Self {
        Self {
            source: RemoteVoiceSource::new(decoder),
            transceivers: Vec::new(),
            fetch: silent_frame(),
            fetch_valid: false,
            audible: false,
        }
    }
}
