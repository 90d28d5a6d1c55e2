//! Spoken output and stock phrases

use crate::error::VoiceResult;
use crate::tts::TtsEngine;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const GREETINGS: &[&str] = &[
    "Hey there! I'm here to chat, help, or just listen. What's on your mind?",
    "Hi! I'm your voice buddy. You can ask me anything, or just talk!",
    "Hello! Ready when you are. Let's get started, yeah?",
];

/// Spoken before a "natural" utterance
pub const FILLERS: &[&str] = &[
    "Hmm...",
    "Okay...",
    "Alright!",
    "Gotcha!",
    "Let me think...",
    "One sec...",
];

/// Transcription came back blank
pub const MISSED: &[&str] = &[
    "Oops, I missed that. Wanna say it again?",
    "Hmm, didn't quite catch that. Can you repeat?",
    "My ears blinked! Try once more?",
    "Sorry, could you say that again a little louder?",
];

/// Nobody spoke before the listen timeout
pub const NOTHING_HEARD: &[&str] = &[
    "I didn't hear anything. Go ahead whenever you're ready.",
    "Still here! Say something when you're ready.",
];

pub const APOLOGY: &str = "Something went wrong. Please try again.";
pub const FRESH_START: &str = "Alright, starting fresh!";
pub const GOODBYE: &str = "Goodbye!";

/// Thin wrapper over the TTS engine
#[derive(Debug, Clone)]
pub struct Voice {
    tts: Arc<dyn TtsEngine>,
    pause: Duration,
}

impl Voice {
    pub fn new(tts: Arc<dyn TtsEngine>, pause: Duration) -> Self {
        Self { tts, pause }
    }

    pub async fn say(&self, text: &str) -> VoiceResult<()> {
        info!("🔊 {}", text);
        self.tts.speak(text).await
    }

    /// Filler first, then the text, then a short pause
    pub async fn say_naturally(&self, text: &str) -> VoiceResult<()> {
        self.say(pick(FILLERS)).await?;
        self.say(text).await?;
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
        Ok(())
    }

    /// Speak without letting a TTS failure escape; used on recovery paths
    pub async fn say_best_effort(&self, text: &str) {
        if let Err(e) = self.say(text).await {
            warn!("⚠️ Could not speak '{}': {}", text, e);
        }
    }
}

/// Random choice; empty slices yield an empty string
pub fn pick<'a>(options: &[&'a str]) -> &'a str {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}
