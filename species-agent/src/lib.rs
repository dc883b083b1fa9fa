//! Species Agent - species intelligence research
//!
//! Provides the core of the research service:
//! - Prompt templates as data, with model parameters
//! - Trait-based LLM backends (Anthropic Messages API, relay, mock)
//! - A response normalizer that turns free-form model text into a fully
//!   populated profile, filling gaps from deterministic fallback text
//! - Intelligence metrics and triangle map coordinates
//! - A daily/monthly usage ledger over a pluggable counter store
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ResearchService               │
//! │  (validate → budget → prompt → call)    │
//! └───────┬─────────────┬──────────────┬────┘
//!         ▼             ▼              ▼
//! ┌─────────────┐ ┌───────────┐ ┌─────────────┐
//! │ LlmBackend  │ │ normalize │ │ UsageLedger │
//! │ (Anthropic/ │ │ + fallback│ │ (Counter    │
//! │  Relay)     │ │           │ │  Store)     │
//! └─────────────┘ └─────┬─────┘ └─────────────┘
//!                       ▼
//!                 metrics / compare
//! ```

pub mod backend;
pub mod budget;
pub mod compare;
pub mod fallback;
pub mod metrics;
pub mod normalize;
pub mod profile;
pub mod prompt;
pub mod request;
pub mod service;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Usage};
pub use backend::{AnthropicBackend, ApiKeySource, MockBackend, RelayBackend};
pub use budget::{
    BudgetError, BudgetLimits, BudgetNotification, BudgetStatus, CostModel, CounterStore,
    MemoryCounterStore, UsageLedger,
};
pub use compare::Comparison;
pub use metrics::{IntelligenceMetrics, MapPoint, TriangleLayout};
pub use normalize::normalize;
pub use profile::{Facet, FrameworkSection, ProfileField, SpeciesProfile};
pub use prompt::{ModelParams, PromptTemplate, ResearchProfile};
pub use request::{ResearchOptions, ResearchRequest, ValidationError};
pub use service::{ComparisonOutcome, ResearchOutcome, ResearchService, ServiceConfig, ServiceError};
