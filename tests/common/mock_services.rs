//! Mock speech, language, weather and QR collaborators

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;
use voicebuddy::audio::CapturedAudio;
use voicebuddy::dialogue::PayloadPrompt;
use voicebuddy::error::{Service, VoiceError, VoiceResult};
use voicebuddy::llm::{CityExtraction, LanguageModel};
use voicebuddy::qr::QrGenerator;
use voicebuddy::stt::SttEngine;
use voicebuddy::weather::{WeatherReport, WeatherService};

/// Scripted transcriptions; an empty script transcribes "exit"
#[derive(Default)]
pub struct MockStt {
    replies: Mutex<VecDeque<VoiceResult<String>>>,
    /// Whether the WAV file existed when each transcription started
    pub file_present: Mutex<Vec<bool>>,
}

impl MockStt {
    pub fn say(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(VoiceError::service(Service::SpeechToText, "mock outage")));
    }
}

#[async_trait]
impl SttEngine for MockStt {
    async fn transcribe(&self, audio: &CapturedAudio) -> VoiceResult<String> {
        self.file_present
            .lock()
            .unwrap()
            .push(audio.path().exists());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("exit".to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockLlm {
    pub city: Mutex<Option<String>>,
    pub reply: Mutex<String>,
    pub fail_chat: AtomicBool,
    pub fail_city: AtomicBool,
    /// Rendered history passed to each chat completion
    pub contexts: Mutex<Vec<String>>,
    pub city_requests: Mutex<Vec<String>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self {
            city: Mutex::new(None),
            reply: Mutex::new("Sure thing.".to_string()),
            fail_chat: AtomicBool::new(false),
            fail_city: AtomicBool::new(false),
            contexts: Mutex::new(Vec::new()),
            city_requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockLlm {
    pub fn set_city(&self, city: Option<&str>) {
        *self.city.lock().unwrap() = city.map(str::to_string);
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    async fn complete_chat(&self, context: &str) -> VoiceResult<String> {
        self.contexts.lock().unwrap().push(context.to_string());
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(VoiceError::service(Service::LanguageModel, "mock rate limit"));
        }
        Ok(self.reply.lock().unwrap().clone())
    }

    async fn extract_city(&self, utterance: &str) -> VoiceResult<CityExtraction> {
        self.city_requests
            .lock()
            .unwrap()
            .push(utterance.to_string());
        if self.fail_city.load(Ordering::SeqCst) {
            return Err(VoiceError::service(Service::LanguageModel, "mock outage"));
        }
        Ok(CityExtraction {
            city: self.city.lock().unwrap().clone(),
        })
    }
}

#[derive(Default)]
pub struct MockWeather {
    pub fail: AtomicBool,
    pub requested: Mutex<Vec<String>>,
}

impl MockWeather {
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherService for MockWeather {
    async fn fetch(&self, city: &str) -> VoiceResult<WeatherReport> {
        self.requested.lock().unwrap().push(city.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(VoiceError::service(Service::Weather, "city not found"));
        }
        Ok(WeatherReport {
            city: city.to_string(),
            temp: 18,
            feels_like: 17,
            condition: "Clouds".to_string(),
            description: "broken clouds".to_string(),
            humidity: 72,
            wind_speed: 3.6,
        })
    }
}

#[derive(Default)]
pub struct MockQr {
    pub fail: AtomicBool,
    pub generated: Mutex<Vec<(String, PathBuf)>>,
    /// Thread each generation ran on
    pub threads: Mutex<Vec<ThreadId>>,
}

impl QrGenerator for MockQr {
    fn generate(&self, payload: &str, destination_dir: &Path) -> VoiceResult<PathBuf> {
        self.threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        if self.fail.load(Ordering::SeqCst) {
            return Err(VoiceError::service(Service::QrCode, "mock encoder failure"));
        }
        let path = destination_dir.join("qrcode_mock.png");
        self.generated
            .lock()
            .unwrap()
            .push((payload.to_string(), path.clone()));
        Ok(path)
    }
}

#[derive(Default)]
pub struct MockPrompt {
    pub payload: Mutex<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockPrompt {
    pub fn set_payload(&self, payload: &str) {
        *self.payload.lock().unwrap() = payload.to_string();
    }
}

#[async_trait]
impl PayloadPrompt for MockPrompt {
    async fn read_payload(&self, prompt: &str) -> VoiceResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.payload.lock().unwrap().trim().to_string())
    }
}
