//! VoiceBuddy Error Types
//!
//! One error enum for every stage of a dialogue turn. The turn loop decides
//! how each variant is recovered; nothing here is fatal on its own.

use std::fmt;
use thiserror::Error;

/// External collaborator that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    SpeechToText,
    TextToSpeech,
    LanguageModel,
    Weather,
    QrCode,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::SpeechToText => "speech-to-text",
            Service::TextToSpeech => "text-to-speech",
            Service::LanguageModel => "language model",
            Service::Weather => "weather",
            Service::QrCode => "qr code",
        };
        f.write_str(name)
    }
}

/// Central error type for VoiceBuddy
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("no speech detected before the listen timeout")]
    CaptureTimeout,

    #[error("transcription was empty")]
    EmptyTranscription,

    #[error("{service} service failed: {message}")]
    Service { service: Service, message: String },

    #[error("conversation turn text must not be empty")]
    InvalidTurn,

    #[error("Audio capture error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoiceError {
    /// Build a collaborator failure from any displayable cause
    pub fn service(service: Service, cause: impl fmt::Display) -> Self {
        VoiceError::Service {
            service,
            message: cause.to_string(),
        }
    }

    /// Stable label used when logging a caught turn failure
    pub fn kind(&self) -> &'static str {
        match self {
            VoiceError::CaptureTimeout => "capture_timeout",
            VoiceError::EmptyTranscription => "empty_transcription",
            VoiceError::Service { .. } => "service_failure",
            VoiceError::InvalidTurn => "invalid_turn",
            VoiceError::Audio(_)
            | VoiceError::Config(_)
            | VoiceError::Io(_)
            | VoiceError::Json(_)
            | VoiceError::Other(_) => "unclassified",
        }
    }
}

/// Result type alias for VoiceBuddy operations
pub type VoiceResult<T> = Result<T, VoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_message() {
        let err = VoiceError::service(Service::Weather, "city not found");
        assert_eq!(err.to_string(), "weather service failed: city not found");
        assert_eq!(err.kind(), "service_failure");
    }

    #[test]
    fn test_kinds_cover_taxonomy() {
        assert_eq!(VoiceError::CaptureTimeout.kind(), "capture_timeout");
        assert_eq!(VoiceError::EmptyTranscription.kind(), "empty_transcription");
        assert_eq!(VoiceError::InvalidTurn.kind(), "invalid_turn");
        assert_eq!(
            VoiceError::Other(anyhow::anyhow!("boom")).kind(),
            "unclassified"
        );
    }
}
