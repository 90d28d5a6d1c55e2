//! Turn Loop
//!
//! Drives the session: capture, transcribe, route, act, speak, repeat.
//! Every failure inside a turn is caught at the turn boundary and recovered
//! here; only an `Exit` intent ends the loop.

use super::cache::{ConversationCache, Role};
use super::handlers::{ActionOutcome, ChatHandler, QrHandler, Utterance, WeatherHandler};
use super::intent::{Intent, IntentRouter};
use super::prompt::PayloadPrompt;
use super::voice::{self, Voice, APOLOGY, FRESH_START, GOODBYE, GREETINGS, MISSED, NOTHING_HEARD};
use crate::audio::AudioSource;
use crate::config::Config;
use crate::error::{VoiceError, VoiceResult};
use crate::llm::LanguageModel;
use crate::qr::QrGenerator;
use crate::stt::SttEngine;
use crate::tts::TtsEngine;
use crate::weather::WeatherService;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Where the loop currently is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Capturing,
    Transcribing,
    Routing,
    Acting,
    Speaking,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Stop,
}

/// What happened during one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub intent: Option<Intent>,
    /// States entered, in order
    pub stages: Vec<LoopState>,
    /// `VoiceError::kind` of the failure, if the turn failed
    pub error_kind: Option<&'static str>,
}

impl TurnReport {
    fn new() -> Self {
        Self {
            outcome: TurnOutcome::Continue,
            intent: None,
            stages: Vec::new(),
            error_kind: None,
        }
    }

    pub fn reached(&self, state: LoopState) -> bool {
        self.stages.contains(&state)
    }
}

/// External collaborators the loop talks to
#[derive(Clone)]
pub struct Collaborators {
    pub audio: Arc<dyn AudioSource>,
    pub stt: Arc<dyn SttEngine>,
    pub tts: Arc<dyn TtsEngine>,
    pub llm: Arc<dyn LanguageModel>,
    pub weather: Arc<dyn WeatherService>,
    pub qr: Arc<dyn QrGenerator>,
    pub prompt: Arc<dyn PayloadPrompt>,
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Exchanges kept before the history resets
    pub max_cache_size: usize,
    pub qr_dir: PathBuf,
    pub natural_pause: Duration,
    /// Sleep after an unexpected failure so a dead device cannot spin the loop
    pub failure_backoff: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_cache_size: config.max_cache_size,
            qr_dir: PathBuf::from(&config.qr_dir),
            natural_pause: config.natural_pause(),
            failure_backoff: Duration::from_millis(500),
        }
    }
}

pub struct TurnLoop {
    audio: Arc<dyn AudioSource>,
    stt: Arc<dyn SttEngine>,
    voice: Voice,
    router: IntentRouter,
    cache: ConversationCache,
    qr: QrHandler,
    weather: WeatherHandler,
    chat: ChatHandler,
    user_name: Option<String>,
    state: LoopState,
    failure_backoff: Duration,
}

impl TurnLoop {
    pub fn new(collaborators: Collaborators, settings: LoopSettings) -> Self {
        let Collaborators {
            audio,
            stt,
            tts,
            llm,
            weather,
            qr,
            prompt,
        } = collaborators;

        Self {
            audio,
            stt,
            voice: Voice::new(tts, settings.natural_pause),
            router: IntentRouter::new(),
            cache: ConversationCache::new(settings.max_cache_size),
            qr: QrHandler::new(qr, prompt, settings.qr_dir),
            weather: WeatherHandler::new(llm.clone(), weather),
            chat: ChatHandler::new(llm),
            user_name: None,
            state: LoopState::Idle,
            failure_backoff: settings.failure_backoff,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn cache(&self) -> &ConversationCache {
        &self.cache
    }

    /// Name the user introduced during this session
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub async fn greet(&self) {
        self.voice.say_best_effort(voice::pick(GREETINGS)).await;
    }

    /// Greet, then run turns until the user asks to exit
    pub async fn run(&mut self) -> VoiceResult<()> {
        info!("🚀 Voice buddy ready");
        self.greet().await;

        loop {
            let report = self.run_turn().await;
            if report.outcome == TurnOutcome::Stop {
                break;
            }
        }

        info!("👋 Session ended");
        Ok(())
    }

    /// One full turn. Never fails; errors and panics are recovered inside.
    pub async fn run_turn(&mut self) -> TurnReport {
        let mut report = TurnReport::new();
        let result = AssertUnwindSafe(self.try_turn(&mut report))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => report.outcome = outcome,
            Ok(Err(e)) => {
                report.error_kind = Some(e.kind());
                self.recover(e).await;
            }
            Err(payload) => {
                report.error_kind = Some("unclassified");
                error!(
                    kind = "unclassified",
                    "💥 Turn panicked: {}",
                    panic_message(payload.as_ref())
                );
                self.voice.say_best_effort(APOLOGY).await;
                self.backoff().await;
            }
        }

        self.state = match report.outcome {
            TurnOutcome::Stop => LoopState::Stopped,
            TurnOutcome::Continue => LoopState::Idle,
        };
        report
    }

    async fn try_turn(&mut self, report: &mut TurnReport) -> VoiceResult<TurnOutcome> {
        self.enter(report, LoopState::Capturing);
        let audio = self.audio.capture().await?;

        self.enter(report, LoopState::Transcribing);
        let transcript = self.stt.transcribe(&audio).await;
        drop(audio);
        let transcript = transcript?;
        let text = transcript.trim();
        if text.is_empty() {
            return Err(VoiceError::EmptyTranscription);
        }
        info!("🗣️ Heard: {}", text);

        self.enter(report, LoopState::Routing);
        let intent = self.router.classify(text);
        info!("🎯 Intent: {}", intent);
        report.intent = Some(intent.clone());

        let action = match intent {
            Intent::Exit => {
                self.enter(report, LoopState::Stopped);
                self.voice.say_best_effort(GOODBYE).await;
                return Ok(TurnOutcome::Stop);
            }
            Intent::NameIntroduction { name } => {
                self.enter(report, LoopState::Acting);
                info!("👤 User name: {}", name);
                let greeting = format!("Nice to meet you, {}! I'll remember that.", name);
                self.user_name = Some(name);
                ActionOutcome::say(Utterance::natural(greeting))
            }
            Intent::QrRequest => {
                self.enter(report, LoopState::Acting);
                self.qr.handle(&self.voice).await?
            }
            Intent::WeatherRequest => {
                self.enter(report, LoopState::Acting);
                self.weather.handle(text, &self.voice).await?
            }
            Intent::Chat => {
                self.enter(report, LoopState::Acting);
                self.chat.handle(text, &mut self.cache, &self.voice).await?
            }
        };

        self.enter(report, LoopState::Speaking);
        self.deliver(action).await?;
        Ok(TurnOutcome::Continue)
    }

    /// Speak the action's utterances, then record the assistant reply
    async fn deliver(&mut self, action: ActionOutcome) -> VoiceResult<()> {
        for utterance in &action.speech {
            if utterance.natural {
                self.voice.say_naturally(&utterance.text).await?;
            } else {
                self.voice.say(&utterance.text).await?;
            }
        }

        if let Some(reply) = action.remember {
            if self.cache.append(Role::Assistant, reply)?.is_some() {
                self.voice.say(FRESH_START).await?;
            }
        }
        Ok(())
    }

    async fn recover(&self, err: VoiceError) {
        match err {
            VoiceError::CaptureTimeout => {
                info!("⏳ Nothing heard");
                self.voice.say_best_effort(voice::pick(NOTHING_HEARD)).await;
            }
            VoiceError::EmptyTranscription => {
                info!("🙉 Empty transcription");
                self.voice.say_best_effort(voice::pick(MISSED)).await;
            }
            VoiceError::InvalidTurn => {
                warn!(kind = err.kind(), "⚠️ Turn dropped: {}", err);
                self.voice.say_best_effort(APOLOGY).await;
            }
            other => {
                error!(kind = other.kind(), "❌ Turn failed: {}", other);
                self.voice.say_best_effort(APOLOGY).await;
                self.backoff().await;
            }
        }
    }

    async fn backoff(&self) {
        if !self.failure_backoff.is_zero() {
            tokio::time::sleep(self.failure_backoff).await;
        }
    }

    fn enter(&mut self, report: &mut TurnReport, state: LoopState) {
        self.state = state;
        report.stages.push(state);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
