//! LLM Backend abstraction layer.
//!
//! Provides a trait-based interface over the upstreams that produce raw
//! profile text:
//! - Anthropic Messages API
//! - Relay to another research endpoint
//! - Mock backend for testing

pub mod anthropic;
pub mod mock;
pub mod relay;
pub mod traits;

pub use anthropic::{AnthropicBackend, ApiKeySource};
pub use mock::MockBackend;
pub use relay::RelayBackend;
pub use traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Usage};
