//! The radio mixing engine.
//!
//! [`RadioMixer`] is the per-frame orchestrator. On every output tick it
//! prefetches one decoded frame from each active remote stream, routes the
//! frames to the radios whose frequency matches one of the stream's
//! transceivers, applies the per-radio artefact chain, and sums the result
//! into mono or split-stereo output. On the transmit side it meters and
//! gates microphone frames and assembles outgoing voice packets.
//!
//! # Locking
//!
//! Two locks guard the engine: the radio-state lock (radio slots, scratch
//! buffers, tx bookkeeping) and the stream-map lock (both destination maps
//! and the append side of every contained source). The mixing tick takes
//! them in that fixed order; the input path takes its own lock first and
//! the radio-state lock second. `ptt`, `tx_sequence` and the audible-stream
//! count are plain atomics.

use crate::codec::VoiceCodec;
use crate::config::RadioConfig;
use crate::dto::{
    self, AUDIO_RECEIVED, AUDIO_TRANSMITTED, AudioReceived, AudioTransmitted, TxTransceiver,
};
use crate::input::{self, FramePreprocessor, InputPath};
use crate::radio::RadioState;
use crate::resources::EffectResources;
use crate::source::CallsignMeta;
use crate::{DatagramSink, RadioError};
use skywave_core::{
    Effect, FRAME_SIZE_SAMPLES, Frame, SampleSource, SourceStatus, hard_clip, interleave,
    mix_into, silent_frame,
};
use skywave_effects::{RecordedSampleSource, SineToneSource};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const FX_CLICK_GAIN: f32 = 1.3;
const FX_BLOCK_TONE_GAIN: f32 = 0.25;
const FX_BLOCK_TONE_FREQ_HZ: f32 = 180.0;
const FX_AC_BUS_GAIN_VHF: f32 = 0.005;
const FX_AC_BUS_GAIN_HF: f32 = 0.001;
const FX_VHF_WHITE_NOISE_GAIN: f32 = 0.17;
const FX_HF_WHITE_NOISE_GAIN: f32 = 0.16;

/// Frequencies below 30 MHz are treated as HF.
const HF_BAND_LIMIT_HZ: u32 = 30_000_000;

#[inline]
fn freq_is_hf(frequency: u32) -> bool {
    frequency < HF_BAND_LIMIT_HZ
}

/// Lock helper that survives a poisoned mutex; a panicked audio callback
/// must not take the whole engine down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which output a radio (and its mixed audio) is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDestination {
    /// The operator's headset.
    Headset,
    /// The cockpit/console speaker.
    Speaker,
}

impl OutputDestination {
    #[inline]
    fn is_headset(self) -> bool {
        matches!(self, OutputDestination::Headset)
    }
}

/// Fixed scratch buffers for one output destination.
struct OutputDeviceState {
    channel: Frame,
    left: Frame,
    right: Frame,
    mono: Frame,
    fetch: Frame,
}

impl OutputDeviceState {
    fn new() -> Self {
        Self {
            channel: silent_frame(),
            left: silent_frame(),
            right: silent_frame(),
            mono: silent_frame(),
            fetch: silent_frame(),
        }
    }
}

/// Everything guarded by the radio-state lock.
struct RadioBank {
    radios: Vec<RadioState>,
    tx_radio: usize,
    split_channels: bool,
    callsign: String,
    last_frame_ptt: bool,
    headset_state: OutputDeviceState,
    speaker_state: OutputDeviceState,
}

/// Everything guarded by the stream-map lock: one callsign map per
/// destination, because routing policy may differ per radio.
struct StreamMaps {
    headset: HashMap<String, CallsignMeta>,
    speaker: HashMap<String, CallsignMeta>,
}

impl StreamMaps {
    fn map_mut(&mut self, destination: OutputDestination) -> &mut HashMap<String, CallsignMeta> {
        match destination {
            OutputDestination::Headset => &mut self.headset,
            OutputDestination::Speaker => &mut self.speaker,
        }
    }
}

/// The radio mixing engine and voice-stream lifecycle owner.
pub struct RadioMixer {
    resources: EffectResources,
    codec: Box<dyn VoiceCodec>,
    channel: Arc<dyn DatagramSink>,
    cache_timeout: Duration,

    radio_state: Mutex<RadioBank>,
    streams: Mutex<StreamMaps>,
    input: Mutex<InputPath>,

    ptt: AtomicBool,
    tx_sequence: AtomicU32,
    incoming_audio_streams: AtomicU32,
}

impl RadioMixer {
    /// Build a mixer with `config.radio_count` radio slots.
    ///
    /// The codec supplies the transmit encoder up front and one decoder per
    /// remote stream as they appear. The channel is borrowed for the life
    /// of the mixer; packets are dropped silently while it is closed.
    pub fn new(
        resources: EffectResources,
        codec: Box<dyn VoiceCodec>,
        channel: Arc<dyn DatagramSink>,
        config: &RadioConfig,
    ) -> Result<Self, RadioError> {
        let encoder = codec.make_encoder()?;
        let radio_count = config.radio_count.max(1);
        Ok(Self {
            resources,
            codec,
            channel,
            cache_timeout: config.cache_timeout(),
            radio_state: Mutex::new(RadioBank {
                radios: (0..radio_count).map(|_| RadioState::new()).collect(),
                tx_radio: 0,
                split_channels: config.split_channels,
                callsign: String::new(),
                last_frame_ptt: false,
                headset_state: OutputDeviceState::new(),
                speaker_state: OutputDeviceState::new(),
            }),
            streams: Mutex::new(StreamMaps {
                headset: HashMap::new(),
                speaker: HashMap::new(),
            }),
            input: Mutex::new(InputPath::new(encoder, config.microphone_volume)),
            ptt: AtomicBool::new(false),
            tx_sequence: AtomicU32::new(0),
            incoming_audio_streams: AtomicU32::new(0),
        })
    }

    /// Number of radio slots.
    pub fn radio_count(&self) -> usize {
        lock(&self.radio_state).radios.len()
    }

    /// Samples `get_audio_frame` writes per call: one frame, doubled when
    /// split-channel stereo is enabled.
    pub fn output_samples_per_tick(&self) -> usize {
        if self.split_channels() {
            2 * FRAME_SIZE_SAMPLES
        } else {
            FRAME_SIZE_SAMPLES
        }
    }

    /// Whether split-channel stereo output is enabled.
    pub fn split_channels(&self) -> bool {
        lock(&self.radio_state).split_channels
    }

    /// Produce one output tick for `destination` into `out`.
    ///
    /// `out` must hold exactly [`Self::output_samples_per_tick`] samples;
    /// a mismatched buffer yields [`SourceStatus::NoData`] and no audio.
    /// Called from the audio callback; never blocks on I/O.
    pub fn get_audio_frame(&self, destination: OutputDestination, out: &mut [f32]) -> SourceStatus {
        let mut bank = lock(&self.radio_state);
        let mut streams = lock(&self.streams);
        let bank = &mut *bank;
        let map = streams.map_mut(destination);

        let expected = if bank.split_channels {
            2 * FRAME_SIZE_SAMPLES
        } else {
            FRAME_SIZE_SAMPLES
        };
        if out.len() != expected {
            tracing::warn!(
                got = out.len(),
                expected,
                "output buffer does not match one tick; skipping"
            );
            return SourceStatus::NoData;
        }

        // Source prefetch: one decoded frame per active stream, cached in
        // the map entry for the rest of the tick.
        for (callsign, meta) in map.iter_mut() {
            meta.fetch_valid = false;
            meta.audible = false;
            if !meta.source.is_active() {
                continue;
            }
            match meta.source.get_frame(&mut meta.fetch) {
                SourceStatus::Ok => meta.fetch_valid = true,
                status => {
                    tracing::trace!(callsign = %callsign, ?status, "stream silent for this tick");
                }
            }
        }

        let RadioBank {
            radios,
            tx_radio,
            split_channels,
            headset_state,
            speaker_state,
            ..
        } = bank;
        let state = if destination.is_headset() {
            headset_state
        } else {
            speaker_state
        };

        state.left.fill(0.0);
        state.right.fill(0.0);
        state.mono.fill(0.0);

        let ptt = self.ptt.load(Ordering::SeqCst);
        for (slot, radio) in radios.iter_mut().enumerate() {
            if radio.on_headset != destination.is_headset() {
                continue;
            }
            let tx_suppressed = ptt && *tx_radio == slot;
            Self::process_radio(
                radio,
                slot,
                tx_suppressed,
                *split_channels,
                state,
                map,
                &self.resources,
            );
        }

        let audible = map.values().filter(|meta| meta.audible).count();
        self.incoming_audio_streams
            .store(audible as u32, Ordering::SeqCst);

        if *split_channels {
            interleave(&state.left[..], &state.right[..], out);
        } else {
            out.copy_from_slice(&state.mono[..]);
        }
        SourceStatus::Ok
    }

    /// Mix one radio's tick into the destination's mixing buffers.
    fn process_radio(
        radio: &mut RadioState,
        slot: usize,
        tx_suppressed: bool,
        split_channels: bool,
        state: &mut OutputDeviceState,
        streams: &mut HashMap<String, CallsignMeta>,
        resources: &EffectResources,
    ) {
        state.channel.fill(0.0);
        if tx_suppressed {
            // The operator does not monitor their own transmission; drop
            // the artefact chain so it restarts cleanly afterwards.
            radio.reset_effects(false);
            return;
        }

        let mut crackle_gain = 0.0_f32;
        let mut hf_gain = 0.0_f32;
        let mut vhf_gain = 0.0_f32;
        let mut ac_bus_gain = 0.0_f32;
        let mut concurrent_streams = 0_u32;

        for meta in streams.values_mut() {
            if !meta.fetch_valid {
                continue;
            }
            let mut use_stream = false;
            let mut voice_gain = 1.0_f32;
            for tx in &meta.transceivers {
                if tx.frequency != radio.frequency {
                    continue;
                }
                use_stream = true;
                if !radio.bypass_effects {
                    let dr = tx.distance_ratio;
                    let crackle_factor =
                        ((dr.exp() * dr.powi(-4) / 350.0 - 0.007_766_52).clamp(0.0, 0.20)) as f32;
                    if freq_is_hf(tx.frequency) {
                        hf_gain = if radio.hf_squelch {
                            0.0
                        } else {
                            FX_HF_WHITE_NOISE_GAIN
                        };
                        vhf_gain = 0.0;
                        ac_bus_gain = FX_AC_BUS_GAIN_HF;
                        voice_gain = 0.20;
                    } else {
                        hf_gain = 0.0;
                        vhf_gain = FX_VHF_WHITE_NOISE_GAIN;
                        ac_bus_gain = FX_AC_BUS_GAIN_VHF;
                        crackle_gain += crackle_factor * 2.0;
                        voice_gain = 1.0 - crackle_factor * 3.7;
                    }
                }
                // First matching transceiver wins.
                break;
            }
            if use_stream {
                mix_into(&mut state.channel[..], &meta.fetch[..], voice_gain * radio.gain);
                meta.audible = true;
                concurrent_streams += 1;
            }
        }

        if concurrent_streams > 0 {
            if !radio.bypass_effects {
                for sample in state.channel.iter_mut() {
                    *sample = hard_clip(*sample, 1.0);
                }
                radio.vhf_filter.process_block_inplace(&mut state.channel[..]);
                radio.compressor.process_block_inplace(&mut state.channel[..]);

                radio.ensure_effects(resources);
                mix_effect(
                    &mut radio.crackle,
                    crackle_gain * radio.gain,
                    &mut state.fetch,
                    &mut state.channel,
                );
                mix_effect(
                    &mut radio.hf_noise,
                    hf_gain * radio.gain,
                    &mut state.fetch,
                    &mut state.channel,
                );
                mix_effect(
                    &mut radio.vhf_noise,
                    vhf_gain * radio.gain,
                    &mut state.fetch,
                    &mut state.channel,
                );
                mix_effect(
                    &mut radio.ac_bus,
                    ac_bus_gain * radio.gain,
                    &mut state.fetch,
                    &mut state.channel,
                );
            }
            if concurrent_streams > 1 {
                if radio.block_tone.is_none() {
                    radio.block_tone = Some(SineToneSource::new(FX_BLOCK_TONE_FREQ_HZ));
                }
                mix_effect(
                    &mut radio.block_tone,
                    FX_BLOCK_TONE_GAIN * radio.gain,
                    &mut state.fetch,
                    &mut state.channel,
                );
            } else {
                radio.block_tone = None;
            }
        } else {
            radio.reset_effects(true);
            if radio.last_rx_count > 0 {
                // Squelch just closed: play the one-shot click.
                radio.click = Some(RecordedSampleSource::new(resources.click.clone(), false));
            }
        }
        radio.last_rx_count = concurrent_streams;

        // A pending click plays to completion regardless of receive state.
        mix_effect(
            &mut radio.click,
            FX_CLICK_GAIN * radio.gain,
            &mut state.fetch,
            &mut state.channel,
        );

        if split_channels {
            if slot == 0 {
                mix_into(&mut state.left[..], &state.channel[..], 1.0);
            } else if slot == 1 {
                mix_into(&mut state.right[..], &state.channel[..], 1.0);
            }
        } else {
            mix_into(&mut state.mono[..], &state.channel[..], 1.0);
        }
    }

    /// Ingest one frame of microphone samples from the audio callback.
    ///
    /// The frame is preprocessed, scaled, clipped and metered. While PTT is
    /// released (and was released on the previous frame) the frame is
    /// dropped but the transmit sequence still advances so the server can
    /// account for packet loss.
    pub fn put_audio_frame(&self, buffer: &Frame) {
        let mut input = lock(&self.input);

        let mut samples = *buffer;
        if let Some(preprocessor) = input.preprocessor.as_mut() {
            preprocessor.process_frame(&mut samples);
        }
        let volume = input.mic_volume;
        for sample in samples.iter_mut() {
            *sample = hard_clip(*sample * volume, 1.0);
        }
        input.vu_meter.add(input::peak_ratio(&samples[..]));

        if !self.ptt.load(Ordering::SeqCst) && !lock(&self.radio_state).last_frame_ptt {
            self.tx_sequence.fetch_add(1, Ordering::SeqCst);
            return;
        }

        match input.encoder.encode(&samples) {
            Ok(payload) => self.send_compressed_frame(payload),
            Err(error) => tracing::warn!(%error, "encoder failed; dropping microphone frame"),
        }
    }

    /// Assemble and send one outgoing voice packet.
    fn send_compressed_frame(&self, payload: Vec<u8>) {
        if !self.channel.is_open() {
            tracing::trace!("datagram channel closed; dropping voice frame");
            return;
        }
        let (last_packet, transceivers, callsign) = {
            let mut bank = lock(&self.radio_state);
            let last_packet = !self.ptt.load(Ordering::SeqCst);
            bank.last_frame_ptt = !last_packet;
            let id = u16::try_from(bank.tx_radio).unwrap_or(u16::MAX);
            (last_packet, vec![TxTransceiver { id }], bank.callsign.clone())
        };
        let sequence_counter = self.tx_sequence.fetch_add(1, Ordering::SeqCst);
        let packet = AudioTransmitted {
            callsign,
            sequence_counter,
            audio: payload,
            last_packet,
            transceivers,
        };
        match dto::encode_audio_transmitted(&packet) {
            Ok(bytes) => {
                if let Err(error) = self.channel.send_message(AUDIO_TRANSMITTED, &bytes) {
                    tracing::debug!(%error, "voice frame dropped");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to encode voice packet"),
        }
    }

    /// Entry point for decoded datagrams from the channel.
    ///
    /// Unknown message names are ignored. A malformed `AR` payload is
    /// logged, dropped, and reported; existing streams are unaffected.
    pub fn handle_datagram(&self, name: &str, payload: &[u8]) -> Result<(), RadioError> {
        if name != AUDIO_RECEIVED {
            tracing::trace!(name, "ignoring unhandled message");
            return Ok(());
        }
        match dto::decode_audio_received(payload) {
            Ok(packet) => {
                self.rx_voice_packet(packet);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "dropping malformed voice packet");
                Err(error)
            }
        }
    }

    /// Append a received voice packet to the callsign's stream in both
    /// destination maps, creating the streams on first contact.
    ///
    /// Runs on the network thread; holds the stream-map lock briefly.
    pub fn rx_voice_packet(&self, packet: AudioReceived) {
        let now = Instant::now();
        let mut streams = lock(&self.streams);
        let StreamMaps { headset, speaker } = &mut *streams;
        for map in [headset, speaker] {
            match map.entry(packet.callsign.clone()) {
                Entry::Occupied(mut occupied) => {
                    let meta = occupied.get_mut();
                    meta.source.append_packet(&packet, now);
                    meta.transceivers.clone_from(&packet.transceivers);
                }
                Entry::Vacant(vacant) => match self.codec.make_decoder() {
                    Ok(decoder) => {
                        let meta = vacant.insert(CallsignMeta::new(decoder));
                        meta.source.append_packet(&packet, now);
                        meta.transceivers.clone_from(&packet.transceivers);
                        tracing::debug!(callsign = %packet.callsign, "new incoming voice stream");
                    }
                    Err(error) => {
                        tracing::warn!(%error, "cannot create decoder for new stream; dropping");
                    }
                },
            }
        }
    }

    /// Evict streams idle beyond the cache timeout from both maps.
    /// Called by the maintenance ticker.
    pub fn maintain_incoming_streams(&self) {
        self.sweep_idle_streams(Instant::now());
    }

    fn sweep_idle_streams(&self, now: Instant) {
        let timeout = self.cache_timeout;
        let mut streams = lock(&self.streams);
        for map in [&mut streams.headset, &mut streams.speaker] {
            map.retain(|callsign, meta| {
                let idle = now.duration_since(meta.source.last_activity());
                if idle > timeout {
                    tracing::debug!(callsign = %callsign, ?idle, "evicting idle voice stream");
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Tear the session state down: clear both stream maps, zero the
    /// transmit sequence, release PTT and reset the encoder. Idempotent,
    /// and safe against an in-flight audio callback.
    pub fn reset(&self) {
        {
            let mut bank = lock(&self.radio_state);
            bank.last_frame_ptt = false;
        }
        {
            let mut streams = lock(&self.streams);
            streams.headset.clear();
            streams.speaker.clear();
        }
        self.ptt.store(false, Ordering::SeqCst);
        self.tx_sequence.store(0, Ordering::SeqCst);
        self.incoming_audio_streams.store(0, Ordering::SeqCst);
        {
            let mut input = lock(&self.input);
            input.vu_meter.reset();
            if let Err(error) = input.encoder.reset() {
                tracing::warn!(%error, "encoder reset failed");
            }
        }
        tracing::info!("radio mixer reset");
    }

    /// Tune a radio. Setting the current frequency again is a no-op; a real
    /// change drops the artefact chain but keeps any pending click so the
    /// squelch transient plays on the new frequency.
    pub fn set_frequency(&self, radio: usize, frequency: u32) {
        let mut bank = lock(&self.radio_state);
        let Some(state) = bank.radios.get_mut(radio) else {
            return;
        };
        if state.frequency == frequency {
            return;
        }
        state.frequency = frequency;
        state.reset_effects(true);
        tracing::info!(radio, frequency, "radio tuned");
    }

    /// Set a radio's linear output gain.
    pub fn set_gain(&self, radio: usize, gain: f32) {
        let mut bank = lock(&self.radio_state);
        if let Some(state) = bank.radios.get_mut(radio) {
            state.gain = gain;
            tracing::debug!(radio, gain, "radio gain set");
        }
    }

    /// Select the transmitting radio.
    pub fn set_tx_radio(&self, radio: usize) {
        let mut bank = lock(&self.radio_state);
        if radio < bank.radios.len() {
            bank.tx_radio = radio;
            tracing::debug!(radio, "tx radio selected");
        }
    }

    /// Route a radio to the headset or the speaker.
    pub fn set_on_headset(&self, radio: usize, on_headset: bool) {
        let mut bank = lock(&self.radio_state);
        if let Some(state) = bank.radios.get_mut(radio) {
            state.on_headset = on_headset;
        }
    }

    /// Enable split-channel output (radio 0 left, radio 1 right).
    pub fn set_split_channels(&self, split: bool) {
        lock(&self.radio_state).split_channels = split;
    }

    /// Enable or bypass the artefact chain on every radio.
    pub fn set_enable_output_effects(&self, enable: bool) {
        let mut bank = lock(&self.radio_state);
        for radio in &mut bank.radios {
            radio.bypass_effects = !enable;
        }
    }

    /// Gate the HF white-noise bed on every radio.
    pub fn set_enable_hf_squelch(&self, enable: bool) {
        let mut bank = lock(&self.radio_state);
        for radio in &mut bank.radios {
            radio.hf_squelch = enable;
        }
    }

    /// Raw PTT flip. Guarding against pending transceiver updates is the
    /// session's job; see [`crate::session::RadioSession::set_ptt`].
    pub fn set_ptt(&self, pressed: bool) {
        self.ptt.store(pressed, Ordering::SeqCst);
    }

    /// Set our callsign for outgoing packets.
    pub fn set_callsign(&self, callsign: &str) {
        lock(&self.radio_state).callsign = callsign.to_owned();
    }

    /// Set the microphone volume multiplier.
    pub fn set_microphone_volume(&self, volume: f32) {
        lock(&self.input).mic_volume = volume;
    }

    /// Install or remove the input preprocessor.
    pub fn set_preprocessor(&self, preprocessor: Option<Box<dyn FramePreprocessor>>) {
        lock(&self.input).preprocessor = preprocessor;
    }

    /// Whether an input preprocessor is installed.
    pub fn has_preprocessor(&self) -> bool {
        lock(&self.input).preprocessor.is_some()
    }

    /// Windowed VU average as a [0, 1] ratio.
    pub fn vu_average(&self) -> f64 {
        lock(&self.input).vu_meter.average()
    }

    /// Windowed VU peak as a [0, 1] ratio.
    pub fn vu_peak(&self) -> f64 {
        lock(&self.input).vu_meter.max()
    }

    /// Whether this radio is the transmitting one and PTT is held.
    pub fn tx_active(&self, radio: usize) -> bool {
        lock(&self.radio_state).tx_radio == radio && self.ptt.load(Ordering::SeqCst)
    }

    /// Whether this radio mixed at least one stream on the previous tick.
    pub fn rx_active(&self, radio: usize) -> bool {
        lock(&self.radio_state)
            .radios
            .get(radio)
            .is_some_and(|state| state.last_rx_count > 0)
    }

    /// Number of sources audible (matched at least one radio) in the last
    /// mixing tick.
    pub fn incoming_audio_streams(&self) -> u32 {
        self.incoming_audio_streams.load(Ordering::SeqCst)
    }
}

/// Pull one frame from an optional effect source and mix it in at `gain`,
/// dropping the source once it yields anything other than `Ok`.
fn mix_effect<S: SampleSource>(
    slot: &mut Option<S>,
    gain: f32,
    fetch: &mut Frame,
    channel: &mut Frame,
) {
    let Some(source) = slot.as_mut() else {
        return;
    };
    if gain <= 0.0 {
        return;
    }
    match source.get_frame(fetch) {
        SourceStatus::Ok => mix_into(&mut channel[..], &fetch[..], gain),
        _ => *slot = None,
    }
}
