//! Audio capture module
//!
//! A turn starts by capturing one spoken phrase. The phrase is written to a
//! temporary WAV file that lives exactly as long as its [`CapturedAudio`].

pub mod microphone;
pub mod phrase;

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use microphone::MicrophoneSource;
pub use phrase::{PhraseDetector, PhraseState};

/// Source of spoken phrases for the turn loop
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Block until one phrase is captured.
    ///
    /// Returns `VoiceError::CaptureTimeout` when nobody spoke in time.
    async fn capture(&self) -> VoiceResult<CapturedAudio>;
}

/// One captured phrase, backed by a temporary WAV file removed on drop
#[derive(Debug)]
pub struct CapturedAudio {
    path: PathBuf,
    samples: Vec<i16>,
    sample_rate: u32,
}

impl CapturedAudio {
    /// Write `samples` as 16-bit mono WAV into `dir` under a unique name
    pub fn persist(samples: Vec<i16>, sample_rate: u32, dir: &Path) -> VoiceResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(temp_file_name());

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let write = || -> Result<(), hound::Error> {
            let mut writer = hound::WavWriter::create(&path, spec)?;
            for &sample in &samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&path);
            return Err(VoiceError::Audio(format!("Failed to save audio: {}", e)));
        }

        debug!("💾 Saved {} samples to {}", samples.len(), path.display());
        Ok(Self {
            path,
            samples,
            sample_rate,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Phrase length in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Little-endian PCM bytes for streaming protocols
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Read the WAV file back for upload
    pub fn wav_bytes(&self) -> VoiceResult<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

impl Drop for CapturedAudio {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("🧹 Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️ Could not delete temp file {}: {}", self.path.display(), e),
        }
    }
}

fn temp_file_name() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!(
        "temp_{}_{:08x}.wav",
        chrono::Local::now().format("%Y%m%d%H%M%S%3f"),
        suffix
    )
}

/// Calculate audio energy (RMS) for speech detection
pub fn calculate_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}
