//! Wyoming Protocol Client
//!
//! Implements the Wyoming protocol for external ASR services.
//! Wyoming is a simple protocol where events are JSON lines over TCP.
//!
//! Reference: https://github.com/rhasspy/wyoming

use super::{clean_transcript, stt_error, SttEngine};
use crate::audio::CapturedAudio;
use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Wyoming event types sent or read by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WyomingEvent {
    /// Describe request (handshake)
    #[serde(rename = "describe")]
    Describe,

    /// Start of audio stream
    #[serde(rename = "audio-start")]
    AudioStart(AudioFormat),

    /// Audio chunk
    #[serde(rename = "audio-chunk")]
    AudioChunk(AudioChunkData),

    /// End of audio stream
    #[serde(rename = "audio-stop")]
    AudioStop,

    /// Transcript result
    #[serde(rename = "transcript")]
    Transcript(TranscriptData),
}

/// Audio format shared by start and chunk events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioFormat {
    pub rate: u32,
    pub width: u8,
    pub channels: u8,
}

/// Audio chunk data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChunkData {
    #[serde(flatten)]
    pub format: AudioFormat,
    #[serde(with = "base64_bytes")]
    pub audio: Vec<u8>,
    #[serde(default)]
    pub timestamp: u64,
}

/// Transcript result data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptData {
    pub text: String,
}

/// Base64 serialization for audio bytes
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Events for one phrase, in send order
pub fn phrase_events(audio: &CapturedAudio) -> Vec<WyomingEvent> {
    let format = AudioFormat {
        rate: audio.sample_rate(),
        width: 2,
        channels: 1,
    };
    vec![
        WyomingEvent::AudioStart(format.clone()),
        WyomingEvent::AudioChunk(AudioChunkData {
            format,
            audio: audio.pcm_bytes(),
            timestamp: 0,
        }),
        WyomingEvent::AudioStop,
    ]
}

/// Pull the transcript text out of one received line, if it is a transcript
fn transcript_from_line(line: &str) -> Option<String> {
    match serde_json::from_str::<WyomingEvent>(line.trim()) {
        Ok(WyomingEvent::Transcript(data)) => Some(data.text),
        _ => None,
    }
}

/// Wyoming client for ASR services
pub struct WyomingStt {
    host: String,
    port: u16,
    timeout: Duration,
}

impl WyomingStt {
    /// Create a new Wyoming client
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    async fn send(
        writer: &mut tokio::net::tcp::OwnedWriteHalf,
        event: &WyomingEvent,
    ) -> VoiceResult<()> {
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn exchange(&self, audio: &CapturedAudio) -> VoiceResult<String> {
        let stream = TcpStream::connect((&*self.host, self.port))
            .await
            .map_err(|e| stt_error(format!("Failed to connect to Wyoming server: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        Self::send(&mut writer, &WyomingEvent::Describe).await?;
        writer.flush().await?;

        let mut line = String::new();
        reader.read_line(&mut line).await?;
        debug!("Wyoming handshake: {}", line.trim());

        for event in phrase_events(audio) {
            Self::send(&mut writer, &event).await?;
        }
        writer.flush().await?;

        debug!(
            "Sent audio ({} samples), waiting for transcript...",
            audio.samples().len()
        );

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(String::new());
            }
            if let Some(text) = transcript_from_line(&line) {
                return Ok(text);
            }
        }
    }
}

#[async_trait]
impl SttEngine for WyomingStt {
    async fn transcribe(&self, audio: &CapturedAudio) -> VoiceResult<String> {
        if audio.samples().is_empty() {
            return Ok(String::new());
        }

        let transcript = tokio::time::timeout(self.timeout, self.exchange(audio))
            .await
            .map_err(|_| stt_error("Timeout waiting for transcript"))??;

        info!("📝 Wyoming transcript: '{}'", transcript);
        Ok(clean_transcript(&transcript))
    }

    fn name(&self) -> &str {
        "wyoming"
    }
}
