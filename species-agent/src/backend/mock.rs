//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// Mock backend for testing.
///
/// Replies with a fixed outcome, or with a scripted sequence of outcomes
/// followed by the fixed one. Records every prompt it receives.
pub struct MockBackend {
    model_id: String,
    outcome: Result<String, LlmError>,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    usage: Option<Usage>,
    call_count: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            outcome: Ok("Mock response".to_string()),
            script: Mutex::new(VecDeque::new()),
            usage: None,
            call_count: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Set the response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.outcome = Ok(content.into());
        self
    }

    /// Fail every call with `error`.
    pub fn with_error(mut self, error: LlmError) -> Self {
        self.outcome = Err(error);
        self
    }

    /// Queue an outcome to be returned before the fixed one.
    pub fn then(self, outcome: Result<String, LlmError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Report this usage on every successful call.
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(Usage {
            prompt_tokens,
            completion_tokens,
        });
        self
    }

    /// Get the number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt().to_string());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let content = scripted.unwrap_or_else(|| self.outcome.clone())?;

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::Stop,
            usage: self.usage,
        })
    }
}
