//! Minimal client for OpenAI-compatible `chat/completions` endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use trendsage_core::AppConfig;

use crate::error::InsightError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

pub struct ChatClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl ChatClient {
    /// # Errors
    ///
    /// Returns [`InsightError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, InsightError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Builds a client from config, or `None` when `OPENAI_API_KEY` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, InsightError> {
        let Some(key) = config.openai_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(key, config.openai_timeout())?.with_base_url(&config.openai_base_url);
        Ok(Some(client))
    }

    /// Sends one chat completion and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`InsightError::Http`] on transport failure or timeout
    /// - [`InsightError::Status`] on a non-2xx response
    /// - [`InsightError::EmptyResponse`] when there is no choice or it has no text
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, InsightError> {
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %request.model, max_tokens = request.max_tokens, "chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Status {
                status: status.as_u16(),
                message: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(InsightError::EmptyResponse)
    }
}
