//! Client session: PTT guarding, transceiver synchronization and events.
//!
//! The enclosing client publishes its transceiver set (id, frequency,
//! position) to the API server over HTTPS; until the server has
//! acknowledged the current set, opening push-to-talk would transmit on
//! frequencies the server does not know about. [`RadioSession`] therefore
//! guards PTT: a press while an update round-trip is pending (or while the
//! tuned frequencies differ from the acknowledged ones) is deferred, and
//! the actual flip happens when the authoritative set is back in sync.
//!
//! Client-visible happenings are delivered through [`EventDispatcher`]: a
//! list of listener functions invoked synchronously from the emitting
//! thread. Listeners must be quick and must not re-enter the mixer.

use crate::mixer::RadioMixer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Events surfaced to the enclosing client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The voice server connection came up.
    VoiceConnected,
    /// The voice server connection went away; the mixer has been reset.
    VoiceDisconnected,
    /// Push-to-talk actually opened (possibly after a guard delay).
    PttOpen,
    /// Push-to-talk closed.
    PttClosed,
    /// The platform audio backend reported a failure.
    AudioError(String),
}

type Listener = Box<dyn Fn(&ClientEvent) + Send + Sync>;

/// A list of listener functions invoked synchronously on emit.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Mutex<Vec<Listener>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are called on the emitting thread and
    /// must not re-enter the mixing engine.
    pub fn add_listener(&self, listener: Listener) {
        lock(&self.listeners).push(listener);
    }

    /// Invoke every listener with `event`.
    pub fn emit(&self, event: &ClientEvent) {
        for listener in lock(&self.listeners).iter() {
            listener(event);
        }
    }
}

/// One entry of a transceiver update bound for the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransceiverUpdate {
    /// Transceiver id (the radio slot).
    pub id: u16,
    /// Tuned frequency in Hz.
    pub frequency: u32,
}

struct SessionState {
    want_ptt: bool,
    ptt: bool,
    update_pending: bool,
    /// Frequencies acknowledged by the server.
    current_frequencies: Vec<u32>,
    /// Frequencies as tuned locally.
    next_frequencies: Vec<u32>,
    /// Snapshot sent with the in-flight update, applied on acknowledge.
    in_flight: Option<Vec<u32>>,
}

/// Session-level wrapper around the mixer: PTT guard plus client events.
pub struct RadioSession {
    mixer: Arc<RadioMixer>,
    events: EventDispatcher,
    state: Mutex<SessionState>,
}

impl RadioSession {
    /// Wrap a mixer. All frequencies start at zero and unsynchronized
    /// state is considered in sync until the first tune.
    #[must_use]
    pub fn new(mixer: Arc<RadioMixer>) -> Self {
        let radio_count = mixer.radio_count();
        Self {
            mixer,
            events: EventDispatcher::new(),
            state: Mutex::new(SessionState {
                want_ptt: false,
                ptt: false,
                update_pending: false,
                current_frequencies: vec![0; radio_count],
                next_frequencies: vec![0; radio_count],
                in_flight: None,
            }),
        }
    }

    /// The event dispatcher for this session.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// The wrapped mixer.
    pub fn mixer(&self) -> &Arc<RadioMixer> {
        &self.mixer
    }

    /// Tune a radio locally. The new frequency takes effect in the mixer
    /// immediately but stays unacknowledged until the next transceiver
    /// update round-trip completes.
    pub fn tune(&self, radio: usize, frequency: u32) {
        {
            let mut state = lock(&self.state);
            let Some(slot) = state.next_frequencies.get_mut(radio) else {
                return;
            };
            *slot = frequency;
        }
        self.mixer.set_frequency(radio, frequency);
    }

    /// Whether the server-acknowledged frequencies match the tuned ones.
    pub fn transceivers_synced(&self) -> bool {
        let state = lock(&self.state);
        state.current_frequencies == state.next_frequencies
    }

    /// Begin a transceiver update round-trip: returns the set to publish
    /// and marks the update pending. PTT presses are guarded until
    /// [`confirm_transceiver_update`](Self::confirm_transceiver_update).
    pub fn begin_transceiver_update(&self) -> Vec<TransceiverUpdate> {
        let mut state = lock(&self.state);
        let snapshot = state.next_frequencies.clone();
        state.update_pending = true;
        state.in_flight = Some(snapshot.clone());
        snapshot
            .iter()
            .enumerate()
            .map(|(id, &frequency)| TransceiverUpdate {
                id: u16::try_from(id).unwrap_or(u16::MAX),
                frequency,
            })
            .collect()
    }

    /// Complete the round-trip. On success the in-flight snapshot becomes
    /// the acknowledged set and a guarded PTT press (if any) is honoured.
    pub fn confirm_transceiver_update(&self, success: bool) {
        let opened = {
            let mut state = lock(&self.state);
            state.update_pending = false;
            if success {
                if let Some(acknowledged) = state.in_flight.take() {
                    state.current_frequencies = acknowledged;
                }
                self.unguard_ptt(&mut state)
            } else {
                state.in_flight = None;
                tracing::warn!("transceiver update failed; PTT stays guarded");
                false
            }
        };
        if opened {
            self.events.emit(&ClientEvent::PttOpen);
        }
    }

    /// Request a PTT change.
    ///
    /// A press is deferred while a transceiver update round-trip is pending
    /// or the tuned set is unacknowledged; the flip then happens inside
    /// [`confirm_transceiver_update`](Self::confirm_transceiver_update).
    /// Releases always take effect immediately.
    pub fn set_ptt(&self, pressed: bool) {
        let event = {
            let mut state = lock(&self.state);
            if pressed {
                state.want_ptt = true;
                if state.update_pending
                    || state.current_frequencies != state.next_frequencies
                {
                    tracing::info!("PTT guarded until transceiver update completes");
                    return;
                }
            } else {
                state.want_ptt = false;
            }
            if state.want_ptt == state.ptt {
                return;
            }
            state.ptt = state.want_ptt;
            self.mixer.set_ptt(state.ptt);
            if state.ptt {
                ClientEvent::PttOpen
            } else {
                ClientEvent::PttClosed
            }
        };
        self.events.emit(&event);
    }

    /// Apply a deferred PTT press once the transceiver set is in sync.
    /// Returns true when PTT actually opened.
    fn unguard_ptt(&self, state: &mut SessionState) -> bool {
        if !state.want_ptt || state.ptt {
            return false;
        }
        if state.current_frequencies != state.next_frequencies {
            tracing::info!("frequencies still unsynchronized; PTT stays guarded");
            return false;
        }
        state.ptt = true;
        self.mixer.set_ptt(true);
        tracing::info!("transceivers in sync; opening guarded PTT");
        true
    }

    /// The voice connection came up.
    pub fn connection_established(&self) {
        self.events.emit(&ClientEvent::VoiceConnected);
    }

    /// The voice connection went away: release PTT, reset the mixer and
    /// notify listeners.
    pub fn connection_lost(&self) {
        {
            let mut state = lock(&self.state);
            state.want_ptt = false;
            state.ptt = false;
            state.update_pending = false;
            state.in_flight = None;
        }
        self.mixer.reset();
        self.events.emit(&ClientEvent::VoiceDisconnected);
    }

    /// Surface an audio backend failure to listeners.
    pub fn notify_audio_error(&self, message: impl Into<String>) {
        self.events.emit(&ClientEvent::AudioError(message.into()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
