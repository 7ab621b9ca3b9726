use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

/// A text-completion model: one prompt in, raw text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, cutting generation at any of `stop`.
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, LlmError>;
}

/// Errors that can occur during LLM calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("model returned no choices")]
    Empty,

    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingKey,
}

/// Client for OpenAI-compatible `/v1/chat/completions` endpoints.
pub struct OpenAiClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [&'a str],
}

fn no_stops(stop: &&[&str]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(LlmError::MissingKey);
        }
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.endpoint)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            stop,
        };

        trace!("prompt for {}:\n{prompt}", self.config.model);
        let resp = self
            .client
            .post(self.url())
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("failed to reach the language model, error({e})");
                LlmError::Connection(e.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("language model returned HTTP {status}");
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::Empty)?;
        debug!("language model replied with {} characters", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_matches_the_chat_api() {
        let stop = ["\nSQLResult:"];
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.0,
            stop: &stop,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{ "role": "user", "content": "hello" }],
                "temperature": 0.0,
                "stop": ["\nSQLResult:"]
            })
        );

        let request = ChatRequest { stop: &[], ..request };
        assert!(serde_json::to_value(&request).unwrap().get("stop").is_none());
    }

    #[test]
    fn response_content_is_extracted() {
        let chat: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "SELECT 1" } }]
        }))
        .unwrap();
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn client_requires_a_key() {
        assert!(matches!(
            OpenAiClient::new(LlmConfig::default()),
            Err(LlmError::MissingKey)
        ));

        let client = OpenAiClient::new(LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        })
        .unwrap();
        assert_eq!(client.url(), "https://api.openai.com/v1/chat/completions");
    }
}
