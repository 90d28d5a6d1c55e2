//! Mock TTS Engine for Testing
//!
//! Records all spoken text for verification.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use voicebuddy::error::{Service, VoiceError, VoiceResult};

/// Mock TTS engine that records spoken text
#[derive(Debug)]
pub struct MockTts {
    /// All text that was "spoken"
    pub spoken: Arc<Mutex<Vec<String>>>,
    /// Simulate failure on every speak
    pub should_fail: Arc<Mutex<bool>>,
}

impl MockTts {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Get all spoken phrases
    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Check if a phrase was spoken
    pub fn was_spoken(&self, text: &str) -> bool {
        self.spoken.lock().unwrap().iter().any(|s| s.contains(text))
    }

    pub fn was_spoken_any(&self, options: &[&str]) -> bool {
        options.iter().any(|option| self.was_spoken(option))
    }

    pub fn clear(&self) {
        self.spoken.lock().unwrap().clear();
    }

    pub fn set_fail(&self, fail: bool) {
        *self.should_fail.lock().unwrap() = fail;
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl voicebuddy::tts::TtsEngine for MockTts {
    async fn speak(&self, text: &str) -> VoiceResult<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(VoiceError::service(Service::TextToSpeech, "Mock TTS failure"));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
