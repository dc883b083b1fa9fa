//! Relay backend.
//!
//! Forwards the research request to another research endpoint (a second
//! deployment of this gateway, or any service speaking the same contract)
//! and hands its answer back as text for the normalizer.
//!
//! Accepted response shapes:
//! - `{"success": true, "response": "<text>"}`: text returned verbatim
//! - `{"success": true, "response": {...}}`: object re-serialized
//! - `{"species": ..., ...}`: a profile returned directly, re-serialized
//!
//! A relayed profile marked `researchBacked: false` or carrying a
//! `fallbackReason` is the relay's own fallback and is rejected.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::traits::*;
use crate::request::ResearchOptions;

/// Backend that delegates to another research endpoint.
pub struct RelayBackend {
    id: String,
    client: Client,
    url: String,
    timeout: Duration,
}

impl RelayBackend {
    /// Create a relay to `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {e}")))?;

        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LlmError::Configuration(format!("Invalid relay URL: {url}")));
        }

        Ok(Self {
            id: format!("relay:{url}"),
            client,
            url,
            timeout,
        })
    }

    async fn send(&self, body: &RelayRequest<'_>) -> Result<CompletionResponse, LlmError> {
        let response = self.client.post(&self.url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            content: extract_text(value)?,
            finish_reason: FinishReason::Unknown,
            usage: None,
        })
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    species: Option<&'a str>,
    prompt: &'a str,
    options: ResearchOptions,
}

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    #[serde(default)]
    success: bool,
    response: Option<Value>,
    error: Option<String>,
}

fn is_fallback_profile(profile: &Value) -> bool {
    profile.get("researchBacked") == Some(&Value::Bool(false))
        || profile.get("fallbackReason").is_some_and(|r| !r.is_null())
}

fn extract_text(value: Value) -> Result<String, LlmError> {
    if value.get("species").is_some() && value.get("response").is_none() {
        if is_fallback_profile(&value) {
            return Err(LlmError::ParseError("Relay returned a fallback profile".to_string()));
        }
        return Ok(value.to_string());
    }

    let envelope: RelayEnvelope =
        serde_json::from_value(value).map_err(|e| LlmError::ParseError(e.to_string()))?;

    match envelope {
        RelayEnvelope {
            success: true,
            response: Some(Value::String(text)),
            ..
        } => Ok(text),
        RelayEnvelope {
            success: true,
            response: Some(object @ Value::Object(_)),
            ..
        } => {
            if is_fallback_profile(&object) {
                return Err(LlmError::ParseError("Relay returned a fallback profile".to_string()));
            }
            Ok(object.to_string())
        }
        RelayEnvelope { error: Some(error), .. } => {
            Err(LlmError::ParseError(format!("Relay reported failure: {error}")))
        }
        _ => Err(LlmError::ParseError("Unexpected relay response".to_string())),
    }
}

#[async_trait]
impl LlmBackend for RelayBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (species, options) = match &request.context {
            Some(ctx) => (Some(ctx.species.as_str()), ctx.options),
            None => (None, ResearchOptions::default()),
        };
        let body = RelayRequest {
            species,
            prompt: request.prompt(),
            options,
        };

        match tokio::time::timeout(self.timeout, self.send(&body)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
