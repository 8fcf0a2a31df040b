//! Wiring between the radio mixer and the audio backend.
//!
//! Builds the headset output stream (and optionally a second speaker
//! output), plus the microphone input stream, all at the stack's fixed
//! 48 kHz / 960-sample format, and drives the mixer's
//! `get_audio_frame` / `put_audio_frame` from the callbacks. Input buffers
//! that do not arrive in whole ticks are re-chunked through a small
//! accumulator.

use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, StreamHandle};
use crate::Result;
use skywave_core::{FRAME_SIZE_SAMPLES, silent_frame};
use skywave_radio::{OutputDestination, RadioError, RadioMixer};
use std::sync::Arc;

/// Device selection for the voice streams.
#[derive(Debug, Clone, Default)]
pub struct VoiceStreamOptions {
    /// Headset output device (substring match), or the system default.
    pub headset_device: Option<String>,
    /// Optional separate speaker output device. No speaker stream is
    /// created when `None`.
    pub speaker_device: Option<String>,
    /// Microphone device (substring match), or the system default.
    pub input_device: Option<String>,
}

/// Live voice streams. Audio flows while this value exists; dropping it
/// stops all three streams.
#[derive(Debug)]
pub struct VoiceStreams {
    _headset: StreamHandle,
    _speaker: Option<StreamHandle>,
    _input: StreamHandle,
}

/// Handler invoked with backend failures, typically forwarding to
/// [`RadioSession::notify_audio_error`](skywave_radio::RadioSession::notify_audio_error).
pub type AudioErrorHandler = Arc<dyn Fn(RadioError) + Send + Sync>;

/// Start the headset/speaker output streams and the microphone input
/// stream, all driving `mixer`.
pub fn start_voice_streams(
    backend: &dyn AudioBackend,
    mixer: Arc<RadioMixer>,
    options: &VoiceStreamOptions,
    on_error: AudioErrorHandler,
) -> Result<VoiceStreams> {
    let output_channels: u16 = if mixer.split_channels() { 2 } else { 1 };

    let headset = backend.build_output_stream(
        &BackendStreamConfig {
            channels: output_channels,
            device_name: options.headset_device.clone(),
            ..BackendStreamConfig::default()
        },
        output_callback(Arc::clone(&mixer), OutputDestination::Headset),
        error_callback(Arc::clone(&on_error), "headset output"),
    )?;

    let speaker = match &options.speaker_device {
        Some(device) => Some(backend.build_output_stream(
            &BackendStreamConfig {
                channels: output_channels,
                device_name: Some(device.clone()),
                ..BackendStreamConfig::default()
            },
            output_callback(Arc::clone(&mixer), OutputDestination::Speaker),
            error_callback(Arc::clone(&on_error), "speaker output"),
        )?),
        None => None,
    };

    let input = backend.build_input_stream(
        &BackendStreamConfig {
            channels: 1,
            device_name: options.input_device.clone(),
            ..BackendStreamConfig::default()
        },
        input_callback(Arc::clone(&mixer)),
        error_callback(on_error, "input"),
    )?;

    tracing::info!(
        split = output_channels == 2,
        speaker = speaker.is_some(),
        "voice streams started"
    );
    Ok(VoiceStreams {
        _headset: headset,
        _speaker: speaker,
        _input: input,
    })
}

/// Output callback pulling whole ticks from the mixer. Trailing partial
/// chunks (misbehaving backends only) are rendered silent.
fn output_callback(
    mixer: Arc<RadioMixer>,
    destination: OutputDestination,
) -> Box<dyn FnMut(&mut [f32]) + Send> {
    Box::new(move |data: &mut [f32]| {
        let tick_len = mixer.output_samples_per_tick();
        for chunk in data.chunks_mut(tick_len) {
            if chunk.len() == tick_len {
                mixer.get_audio_frame(destination, chunk);
            } else {
                chunk.fill(0.0);
            }
        }
    })
}

/// Input callback re-chunking captured samples into whole frames.
fn input_callback(mixer: Arc<RadioMixer>) -> Box<dyn FnMut(&[f32]) + Send> {
    let mut pending: Vec<f32> = Vec::with_capacity(FRAME_SIZE_SAMPLES);
    Box::new(move |data: &[f32]| {
        for &sample in data {
            pending.push(sample);
            if pending.len() == FRAME_SIZE_SAMPLES {
                let mut frame = silent_frame();
                frame.copy_from_slice(&pending);
                mixer.put_audio_frame(&frame);
                pending.clear();
            }
        }
    })
}

fn error_callback(on_error: AudioErrorHandler, stream: &'static str) -> ErrorCallback {
    Box::new(move |message: &str| {
        tracing::warn!(stream, message, "audio backend error");
        on_error(RadioError::AudioDevice(format!("{stream}: {message}")));
    })
}
