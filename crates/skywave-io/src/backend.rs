//! Pluggable audio backend abstraction.
//!
//! [`AudioBackend`] decouples the radio stack from any specific platform
//! audio API. The default implementation wraps cpal; headless tests drive
//! the same callbacks from a mock. The trait uses boxed closures so it
//! stays object-safe, and stream handles are type-erased RAII wrappers
//! that stop the stream on drop.

use crate::{AudioDevice, Result};
use skywave_core::{FRAME_SIZE_SAMPLES, SAMPLE_RATE_HZ};

/// Configuration for building an audio stream.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames. The radio stack works in 960-frame
    /// ticks, so the default keeps callbacks aligned to one tick.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Optional device name filter (uses the system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            buffer_size: FRAME_SIZE_SAMPLES as u32,
            channels: 1,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is live while this handle exists; dropping it stops
/// playback or capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until the
    /// handle is dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback: invoked on the audio thread with an interleaved f32
/// buffer to fill. Implementations must not block on I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Input callback: invoked on the audio thread with captured interleaved
/// f32 samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback: invoked with a human-readable message when the backend
/// fails during streaming.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend trait.
///
/// Object-safe on purpose: the client selects a backend at runtime and the
/// radio stack only ever sees `&dyn AudioBackend`.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "mock").
    fn name(&self) -> &'static str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Get the default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Get the default input device, if any.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Build an output stream; the callback fills each buffer.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build an input stream; the callback receives each captured buffer.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_radio_format() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.buffer_size, 960);
        assert_eq!(config.channels, 1);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn test_stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
