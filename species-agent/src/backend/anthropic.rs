//! Anthropic Messages API backend.
//!
//! One POST to `{base_url}/v1/messages` per call, bounded by a timeout.
//! The API key is resolved when the call is made, not when the backend is
//! built, so a key added to the environment later is picked up and tests
//! can inject a static key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::*;
use crate::prompt::ModelParams;

/// Default Anthropic API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Expected prefix of an Anthropic API key.
pub const API_KEY_PREFIX: &str = "sk-ant-";

/// Where the API key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Read from this environment variable at call time
    Env(String),
    /// Fixed key
    Static(String),
}

impl Default for ApiKeySource {
    fn default() -> Self {
        ApiKeySource::Env("ANTHROPIC_API_KEY".to_string())
    }
}

impl ApiKeySource {
    fn raw(&self) -> Option<String> {
        match self {
            ApiKeySource::Env(var) => std::env::var(var).ok(),
            ApiKeySource::Static(key) => Some(key.clone()),
        }
        .filter(|key| !key.trim().is_empty())
    }

    /// Whether a non-empty key is currently available.
    pub fn is_present(&self) -> bool {
        self.raw().is_some()
    }

    /// Resolve and check the key.
    pub fn resolve(&self) -> Result<String, LlmError> {
        let key = self.raw().ok_or_else(|| {
            let name = match self {
                ApiKeySource::Env(var) => var.as_str(),
                ApiKeySource::Static(_) => "API key",
            };
            LlmError::Configuration(format!("{name} not found"))
        })?;

        if !key.starts_with(API_KEY_PREFIX) {
            return Err(LlmError::Configuration(format!(
                "Invalid API key format, expected prefix {API_KEY_PREFIX}"
            )));
        }

        Ok(key)
    }
}

/// Anthropic Messages API backend.
pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    api_key: ApiKeySource,
    model: String,
    timeout: Duration,
}

impl AnthropicBackend {
    /// Create a backend against `base_url` using the given model parameters.
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKeySource,
        params: &ModelParams,
    ) -> Result<Self, LlmError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: params.model.clone(),
            timeout: params.timeout,
        })
    }

    /// Whether an API key is currently available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_present()
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    async fn send(&self, api_key: &str, body: &MessagesRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        debug!(backend = %self.model, status = status.as_u16(), "Upstream responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let content = messages
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or_else(|| LlmError::ParseError("No text block in response".to_string()))?;

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::from_stop_reason(messages.stop_reason.as_deref()),
            usage: messages.usage.map(|u| Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
        })
    }
}

/// Messages API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

/// Messages API response.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<UsageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.api_key.resolve()?;

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(crate::prompt::DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
            system: request.system_prompt.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: match m.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    },
                    content: m.content.clone(),
                })
                .collect(),
        };

        match tokio::time::timeout(self.timeout, self.send(&api_key, &body)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
