//! Radio mixing engine and voice-stream lifecycle for skywave.
//!
//! This crate is the receiving and transmitting heart of the voice client.
//! It ingests compressed voice packets from an authenticated datagram
//! channel, decodes them into per-callsign sample streams, mixes any number
//! of concurrent transmissions through per-radio artefact chains (band
//! filter, compressor, noise beds, crackle, blocked-carrier tone, squelch
//! click), and renders fixed 20 ms output frames on demand from the audio
//! callback. The transmit side meters the microphone, gates it on
//! push-to-talk, and turns encoded frames into outgoing packets with
//! monotonic sequence numbers.
//!
//! # Main Types
//!
//! - [`RadioMixer`] - the per-frame orchestrator ([`mixer`])
//! - [`RemoteVoiceSource`] - per-callsign decode queue ([`source`])
//! - [`OpusVoiceCodec`] / [`VoiceCodec`] - frame codec collaborators ([`codec`])
//! - [`AudioReceived`] / [`AudioTransmitted`] - wire messages ([`dto`])
//! - [`EffectResources`] - recorded sample beds ([`resources`])
//! - [`StreamMaintenance`] - idle-stream eviction ticker ([`maintenance`])
//! - [`RadioSession`] - PTT guard and client events ([`session`])
//! - [`RadioConfig`] - TOML-backed configuration ([`config`])
//!
//! # Execution Contexts
//!
//! Three contexts cooperate:
//!
//! 1. the **audio callback** calls [`RadioMixer::get_audio_frame`] and
//!    [`RadioMixer::put_audio_frame`] and must never block on I/O,
//! 2. the **network thread** calls [`RadioMixer::handle_datagram`] /
//!    [`RadioMixer::rx_voice_packet`],
//! 3. the **maintenance ticker** sweeps idle streams.
//!
//! Two locks guard shared state: the radio-state lock and the stream-map
//! lock. Where both are needed they are taken in that order (radio state
//! first). The input path has its own lock, taken before either.

pub mod codec;
pub mod config;
pub mod dto;
pub mod input;
pub mod maintenance;
pub mod mixer;
pub mod radio;
pub mod resources;
pub mod session;
pub mod source;

use thiserror::Error;

pub use codec::{CodecError, FrameDecoder, FrameEncoder, OpusVoiceCodec, VoiceCodec};
pub use config::{ConfigError, RadioConfig};
pub use dto::{
    AUDIO_RECEIVED, AUDIO_TRANSMITTED, AudioReceived, AudioTransmitted, RxTransceiver,
    TxTransceiver,
};
pub use input::FramePreprocessor;
pub use maintenance::StreamMaintenance;
pub use mixer::{OutputDestination, RadioMixer};
pub use resources::{EffectResources, ResourceError};
pub use session::{ClientEvent, EventDispatcher, RadioSession, TransceiverUpdate};
pub use source::RemoteVoiceSource;

/// Errors surfaced by the radio stack.
///
/// Decode and codec failures are recovered locally (the offending packet or
/// frame is dropped); a closed channel silently discards outgoing packets;
/// audio device failures are surfaced to the enclosing client as events.
#[derive(Debug, Error)]
pub enum RadioError {
    /// A wire message could not be decoded. The packet is dropped and the
    /// affected stream is left untouched.
    #[error("malformed {name} message: {source}")]
    Decode {
        /// Two-letter wire name of the offending message.
        name: &'static str,
        /// Underlying MessagePack error.
        #[source]
        source: rmp_serde::decode::Error,
    },

    /// A wire message could not be encoded.
    #[error("failed to encode {name} message: {source}")]
    Encode {
        /// Two-letter wire name of the message.
        name: &'static str,
        /// Underlying MessagePack error.
        #[source]
        source: rmp_serde::encode::Error,
    },

    /// The frame codec failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An outgoing packet was attempted while the channel is shut.
    #[error("datagram channel is closed")]
    ChannelClosed,

    /// The platform audio backend reported a failure.
    #[error("audio device error: {0}")]
    AudioDevice(String),
}

/// Outgoing half of the authenticated datagram channel.
///
/// The channel itself (framing, nonces, key agreement) lives outside this
/// crate; the mixer only needs to hand it named, already-encoded messages.
/// Implementations must be cheap and non-blocking: `send_message` is called
/// from the audio callback while the client is transmitting.
pub trait DatagramSink: Send + Sync {
    /// Whether the channel is currently able to carry packets.
    fn is_open(&self) -> bool;

    /// Send one application message. Returns [`RadioError::ChannelClosed`]
    /// when the channel is shut; the caller drops the packet silently.
    fn send_message(&self, name: &str, payload: &[u8]) -> Result<(), RadioError>;
}
