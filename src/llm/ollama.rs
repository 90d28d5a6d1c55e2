//! Ollama AI Integration
//!
//! Local alternative to the hosted model, using `/api/generate`.

use super::{
    chat_prompt, city_prompt, llm_error, parse_city_extraction, CityExtraction, LanguageModel,
};
use crate::config::Config;
use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Ollama API response
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Handles Ollama LLM requests
#[derive(Clone)]
pub struct OllamaModel {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaModel {
    /// Create new Ollama model from config
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.service_timeout())
            .build()
            .map_err(llm_error)?;
        Ok(Self {
            url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            client,
        })
    }

    /// Health check - verify Ollama is reachable
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.url))
            .timeout(std::time::Duration::from_secs(2))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(&self, prompt: &str, json_mode: bool) -> VoiceResult<String> {
        let temperature = if json_mode { 0.1 } else { 0.7 };
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": temperature,
            }
        });
        if json_mode {
            body["format"] = serde_json::json!("json");
        }

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .map_err(llm_error)?;

        let status = response.status();
        let body_text = response.text().await.map_err(llm_error)?;

        if !status.is_success() {
            warn!("❌ Ollama API Error ({}): {}", status, body_text);
            return Err(llm_error(format!("API error {}", status)));
        }

        debug!("🧠 Ollama raw body: {}", body_text);

        let ollama_resp: OllamaResponse = serde_json::from_str(&body_text).map_err(|e| {
            warn!(
                "❌ Failed to deserialize Ollama response: {} - Body: {}",
                e, body_text
            );
            llm_error(e)
        })?;
        Ok(ollama_resp.response.trim().to_string())
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn complete_chat(&self, context: &str) -> VoiceResult<String> {
        let reply = self.generate(&chat_prompt(context), false).await?;
        if reply.is_empty() {
            return Err(llm_error("empty chat reply"));
        }
        Ok(reply)
    }

    async fn extract_city(&self, utterance: &str) -> VoiceResult<CityExtraction> {
        let raw = self.generate(&city_prompt(utterance), true).await?;
        parse_city_extraction(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parse() {
        let body = r#"{"model":"llama3","response":"{\"city\": \"Lima\"}","done":true}"#;
        let parsed: OllamaResponse = serde_json::from_str(body).expect("parse");
        let city = parse_city_extraction(&parsed.response).expect("extract");
        assert_eq!(city.city.as_deref(), Some("Lima"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_service_failure() {
        let mut config = Config::default();
        // reserved port, nothing listens there
        config.ollama_url = "http://127.0.0.1:9".to_string();
        config.service_timeout_secs = 2;
        let model = OllamaModel::new(&config).expect("client");

        assert!(!model.health_check().await);
        let err = model.complete_chat("User: hi").await.unwrap_err();
        assert_eq!(err.kind(), "service_failure");
    }
}
