#![allow(dead_code)]

pub mod mock_audio;
pub mod mock_services;
pub mod mock_tts;

pub use mock_audio::{Capture, MockAudio};
pub use mock_services::{MockLlm, MockPrompt, MockQr, MockStt, MockWeather};
pub use mock_tts::MockTts;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use voicebuddy::dialogue::{Collaborators, LoopSettings, TurnLoop, TurnReport};

/// A turn loop wired to mocks, with handles to inspect each one
pub struct TestContext {
    pub temp_dir: TempDir,
    pub audio: Arc<MockAudio>,
    pub stt: Arc<MockStt>,
    pub tts: Arc<MockTts>,
    pub llm: Arc<MockLlm>,
    pub weather: Arc<MockWeather>,
    pub qr: Arc<MockQr>,
    pub prompt: Arc<MockPrompt>,
    pub turn_loop: TurnLoop,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_cache_size(10)
    }

    pub fn with_cache_size(max_cache_size: usize) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let audio = Arc::new(MockAudio::new(temp_dir.path().join("audio")));
        let stt = Arc::new(MockStt::default());
        let tts = Arc::new(MockTts::new());
        let llm = Arc::new(MockLlm::default());
        let weather = Arc::new(MockWeather::default());
        let qr = Arc::new(MockQr::default());
        let prompt = Arc::new(MockPrompt::default());

        let collaborators = Collaborators {
            audio: audio.clone(),
            stt: stt.clone(),
            tts: tts.clone(),
            llm: llm.clone(),
            weather: weather.clone(),
            qr: qr.clone(),
            prompt: prompt.clone(),
        };
        let settings = LoopSettings {
            max_cache_size,
            qr_dir: temp_dir.path().join("qrcodes"),
            natural_pause: Duration::ZERO,
            failure_backoff: Duration::ZERO,
        };

        Self {
            turn_loop: TurnLoop::new(collaborators, settings),
            temp_dir,
            audio,
            stt,
            tts,
            llm,
            weather,
            qr,
            prompt,
        }
    }

    pub fn qr_dir(&self) -> PathBuf {
        self.temp_dir.path().join("qrcodes")
    }

    /// Transcribe `text` on the next turn and run it
    pub async fn hear(&mut self, text: &str) -> TurnReport {
        self.stt.say(text);
        self.turn_loop.run_turn().await
    }
}
