//! Per-radio state and the effects lifecycle.
//!
//! Each radio slot owns its artefact chain: the lazily instantiated noise
//! and crackle beds, the blocked-carrier tone, the pending squelch click,
//! and the stateful filter/compressor pair. Handles are live only while the
//! radio is actually receiving; the mixer drops them when concurrency falls
//! to zero (scheduling the click on that transition) and on frequency
//! changes (keeping the click so the squelch transient plays on the new
//! frequency).

use crate::resources::EffectResources;
use skywave_core::{Effect, SAMPLE_RATE_HZ};
use skywave_effects::{RecordedSampleSource, SimpleCompressor, SineToneSource, VhfBandFilter};

/// State for one radio slot.
pub(crate) struct RadioState {
    /// Tuned frequency in Hz.
    pub(crate) frequency: u32,
    /// Linear output gain multiplier.
    pub(crate) gain: f32,
    /// Skip the artefact chain, mixing decoded voice straight through.
    pub(crate) bypass_effects: bool,
    /// Suppress the HF white-noise bed.
    pub(crate) hf_squelch: bool,
    /// Routed to the headset output (false: speaker).
    pub(crate) on_headset: bool,
    /// Concurrent streams mixed on the previous tick.
    pub(crate) last_rx_count: u32,

    pub(crate) click: Option<RecordedSampleSource>,
    pub(crate) crackle: Option<RecordedSampleSource>,
    pub(crate) vhf_noise: Option<RecordedSampleSource>,
    pub(crate) hf_noise: Option<RecordedSampleSource>,
    pub(crate) ac_bus: Option<RecordedSampleSource>,
    pub(crate) block_tone: Option<SineToneSource>,

    pub(crate) vhf_filter: VhfBandFilter,
    pub(crate) compressor: SimpleCompressor,
}

impl RadioState {
    pub(crate) fn new() -> Self {
        Self {
            frequency: 0,
            gain: 1.0,
            bypass_effects: false,
            hf_squelch: false,
            on_headset: true,
            last_rx_count: 0,
            click: None,
            crackle: None,
            vhf_noise: None,
            hf_noise: None,
            ac_bus: None,
            block_tone: None,
            vhf_filter: VhfBandFilter::new(),
            compressor: SimpleCompressor::new(SAMPLE_RATE_HZ as f32),
        }
    }

    /// Lazily instantiate the looping beds for an actively receiving radio.
    pub(crate) fn ensure_effects(&mut self, resources: &EffectResources) {
        if self.vhf_noise.is_none() {
            self.vhf_noise = Some(RecordedSampleSource::new(resources.vhf_noise.clone(), true));
        }
        if self.hf_noise.is_none() {
            self.hf_noise = Some(RecordedSampleSource::new(resources.hf_noise.clone(), true));
        }
        if self.crackle.is_none() {
            self.crackle = Some(RecordedSampleSource::new(resources.crackle.clone(), true));
        }
        if self.ac_bus.is_none() {
            self.ac_bus = Some(RecordedSampleSource::new(resources.ac_bus.clone(), true));
        }
    }

    /// Release the effect handles.
    ///
    /// With `keep_click` the pending click (and the previous-tick receive
    /// count that schedules it) survives, as on frequency changes and on the
    /// silence transition. Without it everything is dropped, as when this
    /// radio is the one transmitting.
    pub(crate) fn reset_effects(&mut self, keep_click: bool) {
        if !keep_click {
            self.click = None;
            self.last_rx_count = 0;
        }
        self.block_tone = None;
        self.crackle = None;
        self.vhf_noise = None;
        self.hf_noise = None;
        self.ac_bus = None;
        self.vhf_filter.reset();
        self.compressor.reset();
    }
}
