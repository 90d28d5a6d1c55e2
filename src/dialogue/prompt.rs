//! Typed input for the QR payload

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Source of the text to encode in a QR code
#[async_trait]
pub trait PayloadPrompt: Send + Sync {
    /// Show `prompt` and return the entered line, trimmed
    async fn read_payload(&self, prompt: &str) -> VoiceResult<String>;
}

/// Reads one line from standard input
#[derive(Debug, Default, Clone)]
pub struct StdinPrompt;

#[async_trait]
impl PayloadPrompt for StdinPrompt {
    async fn read_payload(&self, prompt: &str) -> VoiceResult<String> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || -> VoiceResult<String> {
            let mut stdout = std::io::stdout();
            write!(stdout, "{}", prompt)?;
            stdout.flush()?;

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim().to_string())
        })
        .await
        .map_err(|e| VoiceError::Other(anyhow::anyhow!("stdin task failed: {}", e)))?
    }
}
