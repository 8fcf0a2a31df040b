//! Recorded effect sample beds.
//!
//! The artefact chain plays five short PCM recordings: the squelch click,
//! crackle, VHF and HF white-noise beds, and the AC-bus hum. They are read
//! once at startup from mono WAV files and shared immutably between all
//! radios.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors while loading the sample beds.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A WAV file could not be opened or read.
    #[error("failed to read sample bed '{path}': {source}")]
    Read {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying WAV error.
        #[source]
        source: hound::Error,
    },

    /// A WAV file used a sample format the loader does not understand.
    #[error("sample bed '{path}' has unsupported format {format}")]
    UnsupportedFormat {
        /// Path of the offending file.
        path: PathBuf,
        /// Human-readable description of the encountered format.
        format: String,
    },

    /// A WAV file decoded to zero samples.
    #[error("sample bed '{path}' is empty")]
    Empty {
        /// Path of the offending file.
        path: PathBuf,
    },
}

/// The shared, immutable sample beds used by every radio's effect chain.
#[derive(Debug, Clone)]
pub struct EffectResources {
    /// One-shot squelch click transient.
    pub click: Arc<[f32]>,
    /// Looping crackle bed.
    pub crackle: Arc<[f32]>,
    /// Looping VHF white-noise bed.
    pub vhf_noise: Arc<[f32]>,
    /// Looping HF white-noise bed.
    pub hf_noise: Arc<[f32]>,
    /// Looping AC-bus hum bed.
    pub ac_bus: Arc<[f32]>,
}

impl EffectResources {
    /// Load the five beds from `dir` using their conventional file names.
    pub fn load(dir: &Path) -> Result<Self, ResourceError> {
        Ok(Self {
            click: load_bed(&dir.join("click.wav"))?,
            crackle: load_bed(&dir.join("crackle.wav"))?,
            vhf_noise: load_bed(&dir.join("vhf_white_noise.wav"))?,
            hf_noise: load_bed(&dir.join("hf_white_noise.wav"))?,
            ac_bus: load_bed(&dir.join("ac_bus.wav"))?,
        })
    }

    /// Build resources from in-memory buffers (tests, embedded defaults).
    #[must_use]
    pub fn from_buffers(
        click: Vec<f32>,
        crackle: Vec<f32>,
        vhf_noise: Vec<f32>,
        hf_noise: Vec<f32>,
        ac_bus: Vec<f32>,
    ) -> Self {
        Self {
            click: click.into(),
            crackle: crackle.into(),
            vhf_noise: vhf_noise.into(),
            hf_noise: hf_noise.into(),
            ac_bus: ac_bus.into(),
        }
    }
}

/// Read one WAV file as mono f32, keeping the first channel.
fn load_bed(path: &Path) -> Result<Arc<[f32]>, ResourceError> {
    let read_err = |source| ResourceError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(read_err)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .step_by(channels)
            .map(|sample| sample.map(|s| f32::from(s) / 32768.0))
            .collect::<Result<_, _>>()
            .map_err(read_err)?,
        (format, bits) => {
            return Err(ResourceError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format!("{format:?}/{bits}-bit"),
            });
        }
    };

    if samples.is_empty() {
        return Err(ResourceError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(path = %path.display(), samples = samples.len(), "loaded sample bed");
    Ok(samples.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, samples: &[i16], channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_mono_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bed.wav");
        write_wav(&path, &[0, 16384, -16384], 1);

        let bed = load_bed(&path).unwrap();
        assert_eq!(bed.len(), 3);
        assert!((bed[1] - 0.5).abs() < 1e-4);
        assert!((bed[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_load_keeps_first_channel_of_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bed.wav");
        // Interleaved L/R: left ramp, right constant.
        write_wav(&path, &[100, -1, 200, -1, 300, -1], 2);

        let bed = load_bed(&path).unwrap();
        assert_eq!(bed.len(), 3);
        assert!(bed[0] < bed[1] && bed[1] < bed[2]);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bed(&dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, ResourceError::Read { .. }));
    }

    #[test]
    fn test_load_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "click.wav",
            "crackle.wav",
            "vhf_white_noise.wav",
            "hf_white_noise.wav",
            "ac_bus.wav",
        ] {
            write_wav(&dir.path().join(name), &[1000, 2000], 1);
        }
        let resources = EffectResources::load(dir.path()).unwrap();
        assert_eq!(resources.click.len(), 2);
        assert_eq!(resources.ac_bus.len(), 2);
    }
}
