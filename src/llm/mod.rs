//! Language model integration
//!
//! Two operations: free-form chat completion over the rendered history, and
//! structured city extraction for weather requests.

pub mod groq;
pub mod ollama;

use crate::config::Config;
use crate::error::{Service, VoiceError, VoiceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use groq::GroqModel;
pub use ollama::OllamaModel;

/// Result of the city extraction call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityExtraction {
    #[serde(default)]
    pub city: Option<String>,
}

/// Language model collaborator
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Reply to the conversation rendered as `context`
    async fn complete_chat(&self, context: &str) -> VoiceResult<String>;

    /// Pull the city name out of a weather request, or `None`
    async fn extract_city(&self, utterance: &str) -> VoiceResult<CityExtraction>;
}

/// Factory to create the configured language model
pub fn create_model(config: &Config) -> VoiceResult<Arc<dyn LanguageModel>> {
    info!("🛠️ Creating language model: {}", config.llm_engine);
    let model: Arc<dyn LanguageModel> = match config.llm_engine.as_str() {
        "ollama" => Arc::new(OllamaModel::new(config)?),
        "groq" | "openai" => Arc::new(GroqModel::new(config)?),
        other => {
            warn!("  - Unknown LLM engine '{}', falling back to Groq", other);
            Arc::new(GroqModel::new(config)?)
        }
    };
    Ok(model)
}

/// Persona prompt wrapped around the rendered conversation
pub fn chat_prompt(context: &str) -> String {
    format!(
        r#"You are a helpful and friendly chatbot that chats like a buddy. Respond to the person politely, briefly, and in a conversational tone. Keep your replies to 1 sentence for casual or short messages.

However, if the user is asking for detailed help, explanations, or complex information, feel free to use more sentences, but still keep the tone warm, clear, and supportive.

YOU ARE HAVING A CHAT, and the text provided below is part of the conversation you must respond to:

{context}"#
    )
}

/// Extraction prompt demanding a JSON object with a nullable `city`
pub fn city_prompt(utterance: &str) -> String {
    format!(
        r#"You are a smart assistant. Extract the city name if the user is asking for weather.
If not related to weather, return: {{"city": null}}

{utterance}

Respond with ONLY a JSON object in this exact format:
{{"city": "City Name"}} or {{"city": null}}"#
    )
}

/// Parse model output into a `CityExtraction`.
///
/// Models may wrap the JSON in prose, so the first `{` to the last `}` is used.
/// Anything that is not that object is a service failure.
pub fn parse_city_extraction(raw: &str) -> VoiceResult<CityExtraction> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            debug!("No JSON found in extraction response: {}", raw);
            return Err(llm_error(format!("no JSON object in reply: {}", raw.trim())));
        }
    };

    let mut parsed: CityExtraction = serde_json::from_str(&raw[start..=end])
        .map_err(|e| llm_error(format!("malformed extraction JSON: {}", e)))?;

    // blank or "null" strings count as no city
    parsed.city = parsed
        .city
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("null"));
    Ok(parsed)
}

pub(crate) fn llm_error(cause: impl std::fmt::Display) -> VoiceError {
    VoiceError::service(Service::LanguageModel, cause)
}
