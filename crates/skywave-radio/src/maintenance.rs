//! Timer-driven stream maintenance.
//!
//! A dedicated ticker thread calls
//! [`RadioMixer::maintain_incoming_streams`](crate::RadioMixer::maintain_incoming_streams)
//! on a coarse cadence (30 s by default), evicting per-callsign sources
//! that have been idle beyond the cache timeout. The handle stops the
//! thread on drop.

use crate::mixer::RadioMixer;
use crossbeam_channel::{Sender, bounded, select, tick};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Handle to the maintenance ticker thread.
///
/// Dropping the handle (or calling [`stop`](Self::stop)) shuts the thread
/// down and joins it.
pub struct StreamMaintenance {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl StreamMaintenance {
    /// Spawn the ticker sweeping `mixer` every `interval`.
    pub fn spawn(mixer: Arc<RadioMixer>, interval: Duration) -> std::io::Result<Self> {
        let (shutdown, shutdown_rx) = bounded::<()>(1);
        let ticker = tick(interval);
        let handle = std::thread::Builder::new()
            .name("skywave-maintenance".to_owned())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => mixer.maintain_incoming_streams(),
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                tracing::debug!("maintenance ticker stopped");
            })?;
        tracing::debug!(?interval, "maintenance ticker started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stop the ticker and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        // The receiver is gone if the thread already exited; ignore.
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StreamMaintenance {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, FrameDecoder, FrameEncoder, VoiceCodec};
    use crate::config::RadioConfig;
    use crate::dto::AudioReceived;
    use crate::resources::EffectResources;
    use crate::{DatagramSink, RadioError};
    use skywave_core::Frame;

    struct SilentCodec;
    struct SilentDecoder;
    struct SilentEncoder;

    impl FrameDecoder for SilentDecoder {
        fn decode(&mut self, _payload: Option<&[u8]>, out: &mut Frame) -> Result<(), CodecError> {
            out.fill(0.0);
            Ok(())
        }
        fn reset(&mut self) -> Result<(), CodecError> {
            Ok(())
        }
    }

    impl FrameEncoder for SilentEncoder {
        fn encode(&mut self, _frame: &Frame) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
        fn reset(&mut self) -> Result<(), CodecError> {
            Ok(())
        }
    }

    impl VoiceCodec for SilentCodec {
        fn make_encoder(&self) -> Result<Box<dyn FrameEncoder>, CodecError> {
            Ok(Box::new(SilentEncoder))
        }
        fn make_decoder(&self) -> Result<Box<dyn FrameDecoder>, CodecError> {
            Ok(Box::new(SilentDecoder))
        }
    }

    struct NullChannel;

    impl DatagramSink for NullChannel {
        fn is_open(&self) -> bool {
            false
        }
        fn send_message(&self, _name: &str, _payload: &[u8]) -> Result<(), RadioError> {
            Err(RadioError::ChannelClosed)
        }
    }

    #[test]
    fn test_ticker_evicts_idle_streams() {
        let config = RadioConfig {
            cache_timeout_ms: 10,
            ..RadioConfig::default()
        };
        let mixer = Arc::new(
            crate::RadioMixer::new(
                EffectResources::from_buffers(
                    vec![0.0; 8],
                    vec![0.0; 8],
                    vec![0.0; 8],
                    vec![0.0; 8],
                    vec![0.0; 8],
                ),
                Box::new(SilentCodec),
                Arc::new(NullChannel),
                &config,
            )
            .unwrap(),
        );

        mixer.set_frequency(0, 124_500_000);
        mixer.rx_voice_packet(AudioReceived {
            callsign: "IDLE".to_owned(),
            sequence_counter: 0,
            audio: Vec::new(),
            last_packet: false,
            transceivers: vec![crate::dto::RxTransceiver {
                id: 0,
                frequency: 124_500_000,
                distance_ratio: 0.5,
            }],
        });

        let maintenance =
            StreamMaintenance::spawn(Arc::clone(&mixer), Duration::from_millis(20)).unwrap();
        std::thread::sleep(Duration::from_millis(120));
        maintenance.stop();

        // The stream sat idle well past the 10 ms timeout and at least one
        // tick fired, so it must be gone. Had it survived, its still-queued
        // frame would have matched radio 0 on this tick.
        let mut out = vec![0.0; skywave_core::FRAME_SIZE_SAMPLES];
        mixer.get_audio_frame(crate::OutputDestination::Headset, &mut out);
        assert_eq!(mixer.incoming_audio_streams(), 0);
    }
}
