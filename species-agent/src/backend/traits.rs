//! The upstream seam.
//!
//! This module defines the `LlmBackend` trait - the seam between the
//! research service and whichever upstream produces the raw profile text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::request::ResearchOptions;

/// Failure of a single upstream attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Backend is misconfigured (missing or malformed credentials, bad URL)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No complete response within the deadline
    #[error("Upstream timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Upstream answered with a non-success status
    #[error("Upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Upstream body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Configuration errors abort a research request instead of falling back.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Configuration(_))
    }

    /// Short client-safe description. Never includes upstream body text.
    pub fn summary(&self) -> String {
        match self {
            LlmError::Configuration(_) => "upstream misconfigured".to_string(),
            LlmError::Timeout { after_ms } => format!("upstream timed out after {after_ms}ms"),
            LlmError::Upstream { status, .. } => format!("upstream error {status}"),
            LlmError::NetworkError(_) => "upstream unreachable".to_string(),
            LlmError::ParseError(_) => "unreadable upstream response".to_string(),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::ParseError(e.to_string())
        } else {
            LlmError::NetworkError(e.to_string())
        }
    }
}

/// Something that turns a completion request into raw text.
///
/// A backend makes at most one upstream attempt per call. Retrying is the
/// caller's decision.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Identifier used in logs and responses.
    fn id(&self) -> &str;

    /// Make one upstream attempt.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// What is being researched, for backends that take structured input
/// rather than a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchContext {
    pub species: String,
    pub options: ResearchOptions,
}

/// One upstream call: prompt, sampling parameters and subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    /// Output token cap
    pub max_tokens: Option<u32>,
    /// Temperature (0.0-1.0)
    pub temperature: Option<f32>,
    /// Structured description of the research subject
    #[cfg_attr(feature = "typescript", ts(skip))]
    pub context: Option<ResearchContext>,
}

impl CompletionRequest {
    /// Request with a single user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            ..Default::default()
        }
    }

    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Temperature is clamped to [0, 1].
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 1.0));
        self
    }

    /// Attach the research subject.
    pub fn with_context(mut self, species: impl Into<String>, options: ResearchOptions) -> Self {
        self.context = Some(ResearchContext {
            species: species.into(),
            options,
        });
        self
    }

    /// Text of the last user message, i.e. the rendered prompt.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// A chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Raw upstream answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompletionResponse {
    /// Generated content, verbatim
    pub content: String,
    /// Why generation stopped
    pub finish_reason: FinishReason,
    /// Token usage, when the upstream reports it
    pub usage: Option<Usage>,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of turn or stop sequence)
    Stop,
    /// Hit max tokens limit
    Length,
    /// Upstream did not say
    Unknown,
}

impl FinishReason {
    /// Map an Anthropic `stop_reason`.
    pub fn from_stop_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            _ => FinishReason::Unknown,
        }
    }
}

/// Token counts reported by the upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}
