//! Voice codec wrappers.
//!
//! The core does not implement a codec; it consumes one through the
//! [`FrameEncoder`] / [`FrameDecoder`] traits, which move exactly one 20 ms
//! 48 kHz mono frame per call. The production implementation wraps Opus in
//! VoIP mode; tests substitute a trivial PCM codec.

use audiopus::coder::{Decoder as OpusDecoder, Encoder as OpusEncoder};
use audiopus::packet::Packet;
use audiopus::{Application, Channels, MutSignals, SampleRate};
use skywave_core::Frame;
use thiserror::Error;

/// Upper bound on one compressed frame (the Opus hard packet limit).
pub const MAX_COMPRESSED_FRAME_BYTES: usize = 1275;

/// Errors from the frame codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The Opus library rejected the operation.
    #[error("opus codec error: {0}")]
    Opus(#[from] audiopus::Error),

    /// A compressed payload did not describe one full frame.
    #[error("malformed compressed frame: {0}")]
    MalformedPayload(String),
}

/// Encodes one PCM frame into an opaque compressed payload.
pub trait FrameEncoder: Send {
    /// Compress one frame.
    fn encode(&mut self, frame: &Frame) -> Result<Vec<u8>, CodecError>;

    /// Discard encoder state, as after a session reset.
    fn reset(&mut self) -> Result<(), CodecError>;
}

/// Decodes an opaque compressed payload into one PCM frame.
pub trait FrameDecoder: Send {
    /// Decompress one frame into `out`. `None` asks the decoder to conceal
    /// a lost packet with comfort output.
    fn decode(&mut self, payload: Option<&[u8]>, out: &mut Frame) -> Result<(), CodecError>;

    /// Discard decoder state.
    fn reset(&mut self) -> Result<(), CodecError>;
}

/// Factory handing out matched encoder/decoder pairs.
///
/// The mixer keeps one encoder for the microphone path and creates one
/// decoder per remote voice stream.
pub trait VoiceCodec: Send + Sync {
    /// Create an encoder for the transmit path.
    fn make_encoder(&self) -> Result<Box<dyn FrameEncoder>, CodecError>;

    /// Create a decoder for one remote stream.
    fn make_decoder(&self) -> Result<Box<dyn FrameDecoder>, CodecError>;
}

/// Opus in mono VoIP mode at 48 kHz.
pub struct OpusVoiceCodec;

impl VoiceCodec for OpusVoiceCodec {
    fn make_encoder(&self) -> Result<Box<dyn FrameEncoder>, CodecError> {
        Ok(Box::new(OpusFrameEncoder::new()?))
    }

    fn make_decoder(&self) -> Result<Box<dyn FrameDecoder>, CodecError> {
        Ok(Box::new(OpusFrameDecoder::new()?))
    }
}

/// Opus encoder for the microphone path.
pub struct OpusFrameEncoder {
    encoder: OpusEncoder,
    scratch: Vec<u8>,
}

impl OpusFrameEncoder {
    /// Create a mono VoIP encoder at 48 kHz.
    pub fn new() -> Result<Self, CodecError> {
        Ok(Self {
            encoder: OpusEncoder::new(SampleRate::Hz48000, Channels::Mono, Application::Voip)?,
            scratch: vec![0u8; MAX_COMPRESSED_FRAME_BYTES],
        })
    }
}

impl FrameEncoder for OpusFrameEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<u8>, CodecError> {
        let len = self.encoder.encode_float(&frame[..], &mut self.scratch)?;
        Ok(self.scratch[..len].to_vec())
    }

    fn reset(&mut self) -> Result<(), CodecError> {
        // Recreating the coder is the simplest way to drop all prediction
        // state along with any in-flight bitrate adaptation.
        self.encoder = OpusEncoder::new(SampleRate::Hz48000, Channels::Mono, Application::Voip)?;
        Ok(())
    }
}

/// Opus decoder for one remote stream.
pub struct OpusFrameDecoder {
    decoder: OpusDecoder,
}

impl OpusFrameDecoder {
    /// Create a mono decoder at 48 kHz.
    pub fn new() -> Result<Self, CodecError> {
        Ok(Self {
            decoder: OpusDecoder::new(SampleRate::Hz48000, Channels::Mono)?,
        })
    }
}

impl FrameDecoder for OpusFrameDecoder {
    fn decode(&mut self, payload: Option<&[u8]>, out: &mut Frame) -> Result<(), CodecError> {
        let decoded = match payload {
            Some(bytes) => {
                let packet = Packet::try_from(bytes)?;
                let signals = MutSignals::try_from(&mut out[..])?;
                self.decoder.decode_float(Some(packet), signals, false)?
            }
            None => {
                let signals = MutSignals::try_from(&mut out[..])?;
                self.decoder.decode_float(None::<Packet<'_>>, signals, false)?
            }
        };
        // A short decode is a malformed or truncated frame; pad with
        // silence rather than leak stale samples.
        if decoded < out.len() {
            out[decoded..].fill(0.0);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<(), CodecError> {
        self.decoder = OpusDecoder::new(SampleRate::Hz48000, Channels::Mono)?;
        Ok(())
    }
}
