//! Whisper transcription over an OpenAI-compatible HTTP API
//!
//! Uploads the captured WAV to `{stt_url}/audio/transcriptions`.

use super::{clean_transcript, stt_error, SttEngine};
use crate::audio::CapturedAudio;
use crate::config::Config;
use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

pub struct WhisperApiStt {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl WhisperApiStt {
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.service_timeout())
            .build()
            .map_err(stt_error)?;
        Ok(Self {
            base_url: config.stt_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model: config.stt_model.clone(),
            client,
        })
    }
}

#[async_trait]
impl SttEngine for WhisperApiStt {
    async fn transcribe(&self, audio: &CapturedAudio) -> VoiceResult<String> {
        if audio.samples().is_empty() {
            return Ok(String::new());
        }
        if self.api_key.trim().is_empty() {
            return Err(stt_error("API key missing (set GROQ_API_KEY)"));
        }

        info!("🧠 Transcribing {:.1}s of audio...", audio.duration_secs());
        let part = reqwest::multipart::Part::bytes(audio.wav_bytes()?)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(stt_error)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(stt_error)?;

        let status = response.status();
        let body = response.text().await.map_err(stt_error)?;
        if !status.is_success() {
            return Err(stt_error(format!("API error {}: {}", status, body)));
        }

        debug!("Transcription body: {}", body);
        let parsed: TranscriptionResponse = serde_json::from_str(&body).map_err(stt_error)?;
        Ok(clean_transcript(&parsed.text))
    }

    fn name(&self) -> &str {
        "whisper_api"
    }
}
