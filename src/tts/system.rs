//! System fallback TTS engine

use super::{tts_error, TtsEngine};
use crate::error::VoiceResult;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Speech commands tried in order; `--wait` keeps spd-say blocking
const SYSTEM_COMMANDS: &[(&str, &[&str])] = &[("spd-say", &["--wait"]), ("espeak-ng", &[])];

#[derive(Debug)]
pub struct SystemEngine;

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str) -> VoiceResult<()> {
        debug!("System speaking: {}", text);

        for (program, args) in SYSTEM_COMMANDS {
            match Command::new(program).args(*args).arg(text).status().await {
                Ok(status) if status.success() => return Ok(()),
                Ok(status) => {
                    return Err(tts_error(format!("{} exited with {}", program, status)));
                }
                Err(e) => debug!("{} unavailable: {}", program, e),
            }
        }

        Err(tts_error(
            "No system TTS command found (tried spd-say, espeak-ng)",
        ))
    }

    fn name(&self) -> &str {
        "system"
    }
}
