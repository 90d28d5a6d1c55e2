//! STT (Speech-to-Text) Module
//!
//! Provides multiple transcription backends:
//! - Whisper API: OpenAI-compatible HTTP endpoint (Groq by default)
//! - Wyoming: Remote ASR protocol (e.g., faster-whisper)

pub mod whisper_api;
pub mod wyoming;

use crate::audio::CapturedAudio;
use crate::config::Config;
use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub use whisper_api::WhisperApiStt;
pub use wyoming::WyomingStt;

/// Trait for STT engines
#[async_trait]
pub trait SttEngine: Send + Sync {
    /// Transcribe one captured phrase.
    ///
    /// Non-speech audio yields an empty string, not an error.
    async fn transcribe(&self, audio: &CapturedAudio) -> VoiceResult<String>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured STT engine
pub fn create_engine(config: &Config) -> VoiceResult<Arc<dyn SttEngine>> {
    info!("🛠️ Creating STT engine: {}", config.stt_engine);
    match config.stt_engine.as_str() {
        "whisper_api" | "whisper" | "groq" => Ok(Arc::new(WhisperApiStt::new(config)?)),
        "wyoming" => Ok(Arc::new(WyomingStt::new(
            &config.wyoming_host,
            config.wyoming_port,
            config.service_timeout(),
        ))),
        other => {
            warn!("  - Unknown STT engine '{}', falling back to Whisper API", other);
            Ok(Arc::new(WhisperApiStt::new(config)?))
        }
    }
}

/// Normalize engine output; blank results become empty text
pub(crate) fn clean_transcript(text: &str) -> String {
    text.trim().to_string()
}

pub(crate) fn stt_error(cause: impl std::fmt::Display) -> VoiceError {
    VoiceError::service(crate::error::Service::SpeechToText, cause)
}
