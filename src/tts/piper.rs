//! Piper TTS backend calling a local binary

use super::{tts_error, TtsEngine};
use crate::config::Config;
use crate::error::VoiceResult;
use async_trait::async_trait;
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct PiperEngine {
    model_path: PathBuf,
    scratch_dir: PathBuf,
}

impl PiperEngine {
    pub fn new(config: &Config) -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_default()
            .join("voicebuddy/voices");
        let model_path = data_dir.join(format!("{}.onnx", config.piper_voice));

        if !model_path.exists() {
            warn!("⚠️ Piper model not found at {}", model_path.display());
        }

        Self {
            model_path,
            scratch_dir: PathBuf::from(&config.temp_dir),
        }
    }
}

/// Synthesize `text` into `wav_path` with the piper binary
fn synthesize(model_path: &Path, wav_path: &Path, text: &str) -> VoiceResult<()> {
    let mut child = Command::new("piper-tts")
        .arg("-m")
        .arg(model_path)
        .arg("-f")
        .arg(wav_path)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| {
            error!("❌ Failed to spawn piper-tts: {}", e);
            tts_error(format!("Failed to spawn piper-tts: {}", e))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(tts_error(format!("Piper failed with status {}", status)));
    }
    if !wav_path.exists() {
        return Err(tts_error("Piper output file not created"));
    }
    Ok(())
}

/// Play a WAV file to the default output and wait for it to finish
fn play_blocking(wav_path: &Path) -> VoiceResult<()> {
    let (_stream, handle) = rodio::OutputStream::try_default().map_err(tts_error)?;
    let sink = rodio::Sink::try_new(&handle).map_err(tts_error)?;
    let file = std::fs::File::open(wav_path)?;
    let source = rodio::Decoder::new(std::io::BufReader::new(file)).map_err(tts_error)?;
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

#[async_trait]
impl TtsEngine for PiperEngine {
    async fn speak(&self, text: &str) -> VoiceResult<()> {
        info!("📢 Piper speaking: '{}'", text);

        if !self.model_path.exists() {
            return Err(tts_error(format!(
                "Piper model file missing: {}",
                self.model_path.display()
            )));
        }

        let model_path = self.model_path.clone();
        let text_owned = text.to_string();
        let wav_path = self.scratch_dir.join(format!(
            "speech_{:08x}.wav",
            rand::thread_rng().gen::<u32>()
        ));
        std::fs::create_dir_all(&self.scratch_dir)?;

        // Move blocking subprocess and playback work off the runtime
        tokio::task::spawn_blocking(move || -> VoiceResult<()> {
            let result = synthesize(&model_path, &wav_path, &text_owned)
                .and_then(|()| play_blocking(&wav_path));
            debug!("🧹 Removing {}", wav_path.display());
            let _ = std::fs::remove_file(&wav_path);
            result
        })
        .await
        .map_err(|e| tts_error(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "piper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_fails_cleanly() {
        let mut config = Config::default();
        config.piper_voice = "does-not-exist-voice".to_string();
        let engine = PiperEngine::new(&config);

        let err = engine.speak("hello").await.unwrap_err();
        assert_eq!(err.kind(), "service_failure");
    }
}
