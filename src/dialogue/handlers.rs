//! Action handlers
//!
//! Each handler performs the work for one intent and returns what should be
//! said afterwards. Prompts that must be heard before the work happens (the
//! QR payload request, "fetching weather") are spoken directly.

use super::cache::{ConversationCache, Role};
use super::prompt::PayloadPrompt;
use super::text::sanitize_city;
use super::voice::{Voice, FRESH_START};
use crate::error::{Service, VoiceError, VoiceResult};
use crate::llm::LanguageModel;
use crate::qr::QrGenerator;
use crate::weather::{WeatherReport, WeatherService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const QR_REQUEST: &str = "Please provide me a link or some info to create the QR code.";
pub const QR_INPUT_PROMPT: &str = "Enter the link or text for the QR code: ";
pub const QR_GENERATING: &str = "Generating the QR code.";
pub const QR_EMPTY: &str = "There was nothing to encode, so I skipped the QR code.";
pub const QR_FAILED: &str = "Sorry, I couldn't create the QR code.";
pub const WEATHER_WHICH_CITY: &str = "Which city would you like the weather for?";
pub const WEATHER_FAILED: &str = "Sorry, I had trouble getting the weather.";

/// Something to say once the action is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// Speak with a leading filler and trailing pause
    pub natural: bool,
}

impl Utterance {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            natural: false,
        }
    }

    pub fn natural(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            natural: true,
        }
    }
}

/// Result of one action
#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub speech: Vec<Utterance>,
    /// Assistant reply to record in the cache once spoken
    pub remember: Option<String>,
}

impl ActionOutcome {
    pub fn say(utterance: Utterance) -> Self {
        Self {
            speech: vec![utterance],
            ..Default::default()
        }
    }
}

/// Builds a QR image from typed input. QR exchanges are not remembered.
pub struct QrHandler {
    generator: Arc<dyn QrGenerator>,
    prompt: Arc<dyn PayloadPrompt>,
    destination: PathBuf,
}

impl QrHandler {
    pub fn new(
        generator: Arc<dyn QrGenerator>,
        prompt: Arc<dyn PayloadPrompt>,
        destination: PathBuf,
    ) -> Self {
        Self {
            generator,
            prompt,
            destination,
        }
    }

    pub async fn handle(&self, voice: &Voice) -> VoiceResult<ActionOutcome> {
        voice.say_naturally(QR_REQUEST).await?;
        let payload = self.prompt.read_payload(QR_INPUT_PROMPT).await?;
        if payload.trim().is_empty() {
            info!("🔳 Empty QR payload, skipping");
            return Ok(ActionOutcome::say(Utterance::plain(QR_EMPTY)));
        }

        voice.say(QR_GENERATING).await?;
        match self.render(payload.clone()).await {
            Ok(path) => {
                info!("🔳 QR code for '{}' at {}", payload, path.display());
                Ok(ActionOutcome::say(Utterance::natural(format!(
                    "The QR code is generated and saved in {}.",
                    self.destination.display()
                ))))
            }
            Err(e) => {
                error!("❌ QR generation failed: {}", e);
                Ok(ActionOutcome::say(Utterance::plain(QR_FAILED)))
            }
        }
    }

    /// PNG encoding is CPU bound; keep it off the runtime threads
    async fn render(&self, payload: String) -> VoiceResult<PathBuf> {
        let generator = self.generator.clone();
        let destination = self.destination.clone();
        tokio::task::spawn_blocking(move || generator.generate(&payload, &destination))
            .await
            .map_err(|e| {
                VoiceError::service(Service::QrCode, format!("render task failed: {}", e))
            })?
    }
}

/// Looks up current conditions for the city named in the utterance
pub struct WeatherHandler {
    llm: Arc<dyn LanguageModel>,
    weather: Arc<dyn WeatherService>,
}

impl WeatherHandler {
    pub fn new(llm: Arc<dyn LanguageModel>, weather: Arc<dyn WeatherService>) -> Self {
        Self { llm, weather }
    }

    pub async fn handle(&self, utterance: &str, voice: &Voice) -> VoiceResult<ActionOutcome> {
        let extraction = self.llm.extract_city(utterance).await?;
        let city = match extraction.city.as_deref().map(sanitize_city) {
            Some(city) if !city.is_empty() => city,
            _ => {
                info!("🌦️ No city found in '{}'", utterance);
                return Ok(ActionOutcome::say(Utterance::plain(WEATHER_WHICH_CITY)));
            }
        };

        voice
            .say_naturally(&format!("Fetching weather for {}", city))
            .await?;
        match self.weather.fetch(&city).await {
            Ok(report) => Ok(ActionOutcome::say(Utterance::plain(weather_summary(
                &report,
            )))),
            Err(e) => {
                warn!("🌦️ Weather Error: {}", e);
                Ok(ActionOutcome::say(Utterance::plain(WEATHER_FAILED)))
            }
        }
    }
}

/// One sentence: description, temperature, feels-like, humidity, wind
pub fn weather_summary(report: &WeatherReport) -> String {
    format!(
        "The weather in {} is {} with a temperature of {} degrees Celsius, \
         feels like {}, humidity is {} percent, and wind speed is {} meters per second.",
        report.city,
        report.description,
        report.temp,
        report.feels_like,
        report.humidity,
        report.wind_speed
    )
}

/// Free conversation backed by the cache
pub struct ChatHandler {
    llm: Arc<dyn LanguageModel>,
}

impl ChatHandler {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Record the user turn, ask the model with the full history as context.
    ///
    /// A reset caused by the user turn is announced before the model is
    /// called. The assistant turn is recorded by the caller after the reply
    /// is spoken.
    pub async fn handle(
        &self,
        utterance: &str,
        cache: &mut ConversationCache,
        voice: &Voice,
    ) -> VoiceResult<ActionOutcome> {
        if cache.append(Role::User, utterance)?.is_some() {
            // keep the current question so the model never sees empty context
            cache.append(Role::User, utterance)?;
            voice.say(FRESH_START).await?;
        }

        let context = cache.render();
        let reply = self.llm.complete_chat(&context).await?;
        info!("📝 Response: {}", reply);

        Ok(ActionOutcome {
            speech: vec![Utterance::natural(reply.clone())],
            remember: Some(reply),
        })
    }
}
