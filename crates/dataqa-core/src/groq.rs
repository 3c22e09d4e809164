//! Groq chat client: OpenAI-compatible `chat/completions` over reqwest.
//!
//! API key: `GROQ_API_KEY`. Default model: `mixtral-8x7b-32768`, temperature 0.

use crate::config::AppConfig;
use crate::error::{DataQaError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub struct GroqChatClient {
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GroqChatClient {
    /// Requires `config.groq_api_key`; absence is a configuration error.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.groq_api_key.clone().ok_or_else(|| {
            DataQaError::Configuration("GROQ_API_KEY environment variable is not set".to_string())
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.temperature,
            stream: false,
        }
    }

    /// One non-streamed completion. Every failure maps to `AgentInvocation`.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.request(system, user);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DataQaError::AgentInvocation(format!("Groq request failed: {}", e)))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| DataQaError::AgentInvocation(format!("Groq response read failed: {}", e)))?;

        if !status.is_success() {
            return Err(DataQaError::AgentInvocation(format!(
                "Groq API error {}: {}",
                status, text
            )));
        }

        parse_completion(&text)
    }
}

fn parse_completion(text: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(text)
        .map_err(|e| DataQaError::AgentInvocation(format!("Groq response parse failed: {}", e)))?;

    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| DataQaError::AgentInvocation("empty completion".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_configuration_error() {
        let err = GroqChatClient::from_config(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, DataQaError::Configuration(_)));
        assert_eq!(err.to_string(), "GROQ_API_KEY environment variable is not set");
    }

    #[test]
    fn request_is_deterministic_and_uses_configured_model() {
        let cfg = AppConfig::default().with_api_key(Some("gsk_test"));
        let client = GroqChatClient::from_config(&cfg).unwrap();
        let body = serde_json::to_value(client.request("sys", "How many rows?")).unwrap();
        assert_eq!(body["model"], "mixtral-8x7b-32768");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "How many rows?");
    }

    #[test]
    fn parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"42 sedans"}}]}"#;
        assert_eq!(parse_completion(raw).unwrap(), "42 sedans");
    }

    #[test]
    fn empty_choices_is_invocation_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, DataQaError::AgentInvocation(_)));
        assert!(parse_completion("not json").is_err());
    }
}
