//! Audio backend layer for skywave.
//!
//! This crate connects the radio mixing engine to the platform's audio
//! system:
//!
//! - [`AudioBackend`] - object-safe trait over device enumeration and
//!   stream construction ([`backend`])
//! - [`CpalBackend`] - the default implementation wrapping
//!   [cpal](https://crates.io/crates/cpal) ([`cpal_backend`])
//! - [`start_voice_streams`] - wires a
//!   [`RadioMixer`](skywave_radio::RadioMixer) to output and input streams
//!   at the stack's fixed 48 kHz / 960-sample format ([`voice`])
//!
//! The mixing engine itself never owns a device; it is ticked by whatever
//! callbacks this crate (or a test harness) drives it with.

pub mod backend;
pub mod cpal_backend;
pub mod stream;
pub mod voice;

pub use backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use stream::{AudioDevice, default_device, list_devices};
pub use voice::{AudioErrorHandler, VoiceStreamOptions, VoiceStreams, start_voice_streams};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
