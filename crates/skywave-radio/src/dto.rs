//! Application wire messages.
//!
//! Voice packets travel over the datagram channel as self-describing
//! MessagePack maps tagged with a two-letter name. Field names on the wire
//! are fixed by the protocol and differ from Rust conventions, hence the
//! renames.

use crate::RadioError;
use serde::{Deserialize, Serialize};

/// Wire name of the audio-received message.
pub const AUDIO_RECEIVED: &str = "AR";

/// Wire name of the audio-transmitted message.
pub const AUDIO_TRANSMITTED: &str = "AT";

/// A transmitting transceiver as reported in a received voice packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxTransceiver {
    /// Transceiver id within the sending client.
    #[serde(rename = "ID")]
    pub id: u16,
    /// Transmit frequency in Hz.
    #[serde(rename = "Frequency")]
    pub frequency: u32,
    /// Normalized path-loss proxy in [0, 1]; larger means closer.
    #[serde(rename = "DistanceRatio")]
    pub distance_ratio: f64,
}

/// A transceiver reference in an outgoing voice packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxTransceiver {
    /// Transceiver id within this client.
    #[serde(rename = "ID")]
    pub id: u16,
}

/// `AR` - one compressed voice frame received from another station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioReceived {
    /// Callsign of the transmitting station.
    #[serde(rename = "Callsign")]
    pub callsign: String,
    /// Sender's per-session packet counter.
    #[serde(rename = "SequenceCounter")]
    pub sequence_counter: u32,
    /// One compressed audio frame.
    #[serde(rename = "Audio", with = "serde_bytes")]
    pub audio: Vec<u8>,
    /// End-of-transmission marker; sent once per transmission.
    #[serde(rename = "LastPacket")]
    pub last_packet: bool,
    /// Transceivers the sender is transmitting on, latest packet wins.
    #[serde(rename = "Transceivers")]
    pub transceivers: Vec<RxTransceiver>,
}

/// `AT` - one compressed voice frame transmitted by this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTransmitted {
    /// Our callsign.
    #[serde(rename = "Callsign")]
    pub callsign: String,
    /// Monotonic per-session packet counter.
    #[serde(rename = "SequenceCounter")]
    pub sequence_counter: u32,
    /// One compressed audio frame.
    #[serde(rename = "Audio", with = "serde_bytes")]
    pub audio: Vec<u8>,
    /// End-of-transmission marker; true on exactly one packet per release.
    #[serde(rename = "LastPacket")]
    pub last_packet: bool,
    /// Transceivers we are transmitting on.
    #[serde(rename = "Transceivers")]
    pub transceivers: Vec<TxTransceiver>,
}

/// Decode an `AR` message from its MessagePack payload.
pub fn decode_audio_received(payload: &[u8]) -> Result<AudioReceived, RadioError> {
    rmp_serde::from_slice(payload).map_err(|source| RadioError::Decode {
        name: AUDIO_RECEIVED,
        source,
    })
}

/// Encode an `AT` message as a MessagePack map with string keys.
pub fn encode_audio_transmitted(packet: &AudioTransmitted) -> Result<Vec<u8>, RadioError> {
    rmp_serde::to_vec_named(packet).map_err(|source| RadioError::Encode {
        name: AUDIO_TRANSMITTED,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_received() -> AudioReceived {
        AudioReceived {
            callsign: "SWA123".to_owned(),
            sequence_counter: 7,
            audio: vec![1, 2, 3, 4],
            last_packet: false,
            transceivers: vec![RxTransceiver {
                id: 0,
                frequency: 124_500_000,
                distance_ratio: 0.5,
            }],
        }
    }

    #[test]
    fn test_received_round_trip() {
        let original = sample_received();
        let bytes = rmp_serde::to_vec_named(&original).unwrap();
        let decoded = decode_audio_received(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_transmitted_round_trip() {
        let original = AudioTransmitted {
            callsign: "SWA123".to_owned(),
            sequence_counter: 42,
            audio: vec![9, 8, 7],
            last_packet: true,
            transceivers: vec![TxTransceiver { id: 1 }],
        };
        let bytes = encode_audio_transmitted(&original).unwrap();
        let decoded: AudioTransmitted = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_wire_field_names() {
        // The map keys on the wire are the protocol's names, not ours.
        let bytes = encode_audio_transmitted(&AudioTransmitted {
            callsign: "X".to_owned(),
            sequence_counter: 0,
            audio: Vec::new(),
            last_packet: false,
            transceivers: vec![TxTransceiver { id: 0 }],
        })
        .unwrap();
        for key in ["Callsign", "SequenceCounter", "Audio", "LastPacket", "Transceivers", "ID"] {
            let found = bytes
                .windows(key.len())
                .any(|window| window == key.as_bytes());
            assert!(found, "missing wire key {key}");
        }
    }

    #[test]
    fn test_decode_error_is_reported() {
        let err = decode_audio_received(&[0xc1, 0xff, 0x00]).unwrap_err();
        assert!(matches!(err, RadioError::Decode { name: "AR", .. }));
    }
}
