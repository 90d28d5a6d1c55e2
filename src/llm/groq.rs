//! Groq (OpenAI-compatible) chat completions

use super::{
    chat_prompt, city_prompt, llm_error, parse_city_extraction, CityExtraction, LanguageModel,
};
use crate::config::Config;
use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

pub struct GroqModel {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqModel {
    pub fn new(config: &Config) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.service_timeout())
            .build()
            .map_err(llm_error)?;
        Ok(Self {
            base_url: config.llm_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            client,
        })
    }

    /// Send one user message and return the first choice's text
    async fn complete(&self, prompt: &str, json_mode: bool) -> VoiceResult<String> {
        if self.api_key.trim().is_empty() {
            return Err(llm_error("API key missing (set GROQ_API_KEY)"));
        }

        let temperature = if json_mode { 0.0 } else { 0.7 };
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(llm_error)?;

        let status = response.status();
        let body_text = response.text().await.map_err(llm_error)?;
        if !status.is_success() {
            warn!("❌ Groq API Error ({}): {}", status, body_text);
            return Err(llm_error(format!("API error {}", status)));
        }
        debug!("🧠 Groq raw body: {}", body_text);

        let parsed: ChatResponse = serde_json::from_str(&body_text).map_err(llm_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| llm_error("response had no choices"))
    }
}

#[async_trait]
impl LanguageModel for GroqModel {
    async fn complete_chat(&self, context: &str) -> VoiceResult<String> {
        let reply = self.complete(&chat_prompt(context), false).await?;
        if reply.is_empty() {
            return Err(llm_error("empty chat reply"));
        }
        Ok(reply)
    }

    async fn extract_city(&self, utterance: &str) -> VoiceResult<CityExtraction> {
        let raw = self.complete(&city_prompt(utterance), true).await?;
        parse_city_extraction(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_parse() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" Hey! "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.choices[0].message.content.trim(), "Hey!");
    }

    #[tokio::test]
    async fn test_missing_key_is_service_failure() {
        let mut config = Config::default();
        config.llm_api_key = String::new();
        let model = GroqModel::new(&config).expect("client");
        let err = model.complete_chat("User: hi").await.unwrap_err();
        assert_eq!(err.kind(), "service_failure");
    }
}
