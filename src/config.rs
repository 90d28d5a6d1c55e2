use crate::error::{VoiceError, VoiceResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Recognizer tuning applied to every capture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognizerTuning {
    /// RMS energy above which a chunk counts as speech
    pub energy_threshold: f32,
    /// Seconds of non-speech that end a phrase
    pub pause_threshold: f32,
    /// Minimum seconds of speech for a phrase to be kept
    pub phrase_threshold: f32,
    /// Seconds of silence kept around the phrase
    pub non_speaking_duration: f32,
    /// Seconds to wait for speech to start (None waits forever)
    pub listen_timeout: Option<f32>,
    /// Hard cap on phrase length in seconds
    pub phrase_time_limit: f32,
    pub sample_rate: u32,
}

impl Default for RecognizerTuning {
    fn default() -> Self {
        Self {
            energy_threshold: 300.0,
            pause_threshold: 1.0,
            phrase_threshold: 0.2,
            non_speaking_duration: 0.5,
            listen_timeout: None,
            phrase_time_limit: 30.0,
            sample_rate: 16000,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Conversation
    pub max_cache_size: usize,

    // Capture
    pub recognizer: RecognizerTuning,
    pub input_device: Option<usize>,
    pub temp_dir: String,

    // Speech
    pub stt_engine: String,
    pub stt_url: String,
    pub stt_model: String,
    pub wyoming_host: String,
    pub wyoming_port: u16,
    pub tts_engine: String,
    pub piper_voice: String,
    pub natural_pause_ms: u64,

    // AI
    pub llm_engine: String,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: String,
    pub ollama_url: String,
    pub ollama_model: String,

    // Actions
    pub weather_url: String,
    pub weather_api_key: String,
    pub qr_dir: String,

    // Meta
    pub service_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voicebuddy");
        Self {
            max_cache_size: 10,
            recognizer: RecognizerTuning::default(),
            input_device: None,
            temp_dir: std::env::temp_dir()
                .join("voicebuddy")
                .to_string_lossy()
                .to_string(),
            stt_engine: "whisper_api".to_string(),
            stt_url: "https://api.groq.com/openai/v1".to_string(),
            stt_model: "whisper-large-v3".to_string(),
            wyoming_host: "localhost".to_string(),
            wyoming_port: 10300,
            tts_engine: "system".to_string(),
            piper_voice: "en_US-lessac-medium".to_string(),
            natural_pause_ms: 300,
            llm_engine: "groq".to_string(),
            llm_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model: "llama3-8b-8192".to_string(),
            llm_api_key: String::new(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            weather_api_key: String::new(),
            qr_dir: data_dir.join("qrcodes").to_string_lossy().to_string(),
            service_timeout_secs: 20,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from a specific file with graceful degradation
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Secrets and a few paths come from the environment (and `.env`)
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.trim().is_empty() {
                self.llm_api_key = key;
            }
        }
        if let Ok(key) = std::env::var("OPEN_WEATHER_API") {
            if !key.trim().is_empty() {
                self.weather_api_key = key;
            }
        }
        if let Ok(model) = std::env::var("VOICEBUDDY_LLM_MODEL") {
            self.llm_model = model;
        }
        if let Ok(dir) = std::env::var("VOICEBUDDY_QR_DIR") {
            self.qr_dir = dir;
        }
    }

    /// Reject settings the turn loop cannot run with
    pub fn validate(&self) -> VoiceResult<()> {
        if self.max_cache_size == 0 {
            return Err(VoiceError::Config(
                "max_cache_size must be at least 1".to_string(),
            ));
        }

        let tuning = &self.recognizer;
        if tuning.energy_threshold <= 0.0
            || tuning.pause_threshold <= 0.0
            || tuning.phrase_threshold <= 0.0
            || tuning.non_speaking_duration < 0.0
        {
            return Err(VoiceError::Config(
                "recognizer thresholds must be positive".to_string(),
            ));
        }
        if tuning.pause_threshold < tuning.non_speaking_duration {
            return Err(VoiceError::Config(format!(
                "pause_threshold ({}) must not be shorter than non_speaking_duration ({})",
                tuning.pause_threshold, tuning.non_speaking_duration
            )));
        }
        if tuning.sample_rate == 0 {
            return Err(VoiceError::Config("sample_rate must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }

    pub fn natural_pause(&self) -> Duration {
        Duration::from_millis(self.natural_pause_ms)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voicebuddy")
        .join("config.json")
}
