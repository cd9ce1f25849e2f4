// src/services/chat.rs

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const UNAVAILABLE_MESSAGE: &str =
    "Chat service is currently unavailable. Please configure OPENAI_API_KEY in your environment variables.";
pub const QUOTA_MESSAGE: &str = "I'm currently experiencing high demand and my API quota has been exceeded. \
     Please try again later or contact support to add more credits to your OpenAI account.";

pub const ASSISTANT_SYSTEM_PROMPT: &str =
    "You are a helpful chatbot for rainwater harvesting and groundwater management.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat provider not configured")]
    NotConfigured,

    #[error("chat provider quota exceeded")]
    QuotaExceeded,

    #[error("chat provider returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("chat provider returned no choices")]
    EmptyResponse,

    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, req: ChatRequest<'_>) -> Result<String, ChatError>;

    /// Model name when a live provider is configured.
    fn model(&self) -> Option<&str>;
}

/// Used when no API key is configured.
#[derive(Debug, Default, Clone)]
pub struct UnavailableChat;

#[async_trait]
impl ChatProvider for UnavailableChat {
    async fn complete(&self, _req: ChatRequest<'_>) -> Result<String, ChatError> {
        Err(ChatError::NotConfigured)
    }

    fn model(&self) -> Option<&str> {
        None
    }
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self { client, base_url, api_key, model }
    }
}

fn is_quota_error(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("insufficient_quota")
        || body.to_lowercase().contains("rate limit")
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(&self, req: ChatRequest<'_>) -> Result<String, ChatError> {
        let body = CompletionBody {
            model: &self.model,
            messages: [
                Message { role: "system", content: req.system },
                Message { role: "user", content: req.user },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if is_quota_error(status, &text) {
                return Err(ChatError::QuotaExceeded);
            }
            return Err(ChatError::Upstream { status, body: text });
        }

        let parsed: CompletionResponse = resp.json().await?;
        debug!(choices = parsed.choices.len(), "chat completion received");
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ChatError::EmptyResponse)
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_detection() {
        assert!(is_quota_error(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_quota_error(StatusCode::FORBIDDEN, r#"{"error":{"code":"insufficient_quota"}}"#));
        assert!(!is_quota_error(StatusCode::BAD_REQUEST, "bad model"));
    }

    #[tokio::test]
    async fn unavailable_chat_reports_not_configured() {
        let req = ChatRequest { system: "s", user: "u", temperature: 0.7, max_tokens: 10 };
        assert!(matches!(UnavailableChat.complete(req).await, Err(ChatError::NotConfigured)));
        assert!(UnavailableChat.model().is_none());
    }

    #[test]
    fn parses_first_choice() {
        let raw = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Build a pit." } }]
        });
        let parsed: CompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Build a pit."));
    }
}
