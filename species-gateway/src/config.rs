//! Configuration for the species gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use species_agent::backend::anthropic::DEFAULT_BASE_URL;
use species_agent::budget::BudgetLimits;
use species_agent::prompt::{
    ModelParams, PromptTemplate, ResearchProfile, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use species_agent::service::ServiceConfig;
use species_agent::ApiKeySource;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Species gateway - HTTP front end for species intelligence research
#[derive(Parser, Debug, Clone)]
#[command(name = "species-gateway")]
#[command(about = "HTTP gateway for species intelligence research")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8888")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Name of the environment variable holding the Anthropic API key.
    /// The key itself is read on every call, never at startup.
    #[arg(long, env = "ANTHROPIC_API_KEY_VAR", default_value = "ANTHROPIC_API_KEY")]
    pub anthropic_api_key_var: String,

    /// Anthropic API base URL
    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub anthropic_base_url: String,

    /// Upstream model
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub anthropic_model: String,

    /// Output token cap per call
    #[arg(long, env = "MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature in [0, 1]
    #[arg(long, env = "TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Upstream timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Secondary research endpoint tried when the primary upstream fails
    #[arg(long, env = "RELAY_URL")]
    pub relay_url: Option<String>,

    /// Relay timeout in milliseconds
    #[arg(long, env = "RELAY_TIMEOUT_MS", default_value = "8000")]
    pub relay_timeout_ms: u64,

    /// Prompt template (quantum, academic)
    #[arg(long, env = "PROMPT_TEMPLATE", default_value = "quantum")]
    pub prompt_template: String,

    /// Honour a `prompt` supplied in the request body
    #[arg(long, env = "ALLOW_CLIENT_PROMPT", default_value_t = true, action = clap::ArgAction::Set)]
    pub allow_client_prompt: bool,

    /// Upstream calls allowed per UTC day
    #[arg(long, env = "DAILY_REQUEST_LIMIT", default_value = "100")]
    pub daily_request_limit: u32,

    /// Monthly spend limit in USD
    #[arg(long, env = "MONTHLY_BUDGET_USD", default_value = "50.0")]
    pub monthly_budget_usd: f64,

    /// Refuse research with 429 once the budget is exhausted
    #[arg(long, env = "ENFORCE_BUDGET", default_value = "false")]
    pub enforce_budget: bool,

    /// Maximum species per comparison
    #[arg(long, env = "MAX_COMPARE_SPECIES", default_value = "5")]
    pub max_compare_species: usize,
}

impl Args {
    /// Key source for the Anthropic backend
    pub fn api_key(&self) -> ApiKeySource {
        ApiKeySource::Env(self.anthropic_api_key_var.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    /// Relay URL, if one is configured and non-blank
    pub fn relay(&self) -> Option<&str> {
        self.relay_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: self.anthropic_model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.request_timeout(),
        }
    }

    /// Template plus model parameters
    pub fn research_profile(&self) -> Result<ResearchProfile, String> {
        let template = PromptTemplate::builtin(&self.prompt_template)
            .ok_or_else(|| format!("Unknown PROMPT_TEMPLATE: {}", self.prompt_template))?;
        Ok(ResearchProfile::new(template, self.model_params()))
    }

    pub fn budget_limits(&self) -> BudgetLimits {
        BudgetLimits {
            daily_requests: self.daily_request_limit,
            monthly_budget_usd: self.monthly_budget_usd,
            ..Default::default()
        }
    }

    pub fn service_config(&self) -> Result<ServiceConfig, String> {
        Ok(ServiceConfig {
            profile: self.research_profile()?,
            allow_client_prompt: self.allow_client_prompt,
            enforce_budget: self.enforce_budget,
            max_compare_species: self.max_compare_species,
            ..Default::default()
        })
    }

    /// Default tracing filter when RUST_LOG is unset
    pub fn default_log_filter(&self) -> String {
        format!(
            "species_gateway={level},species_agent={level},info",
            level = self.log_level
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.relay().is_some() && self.relay_timeout_ms == 0 {
            return Err("RELAY_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err("TEMPERATURE must be between 0 and 1".to_string());
        }

        if self.max_tokens == 0 {
            return Err("MAX_TOKENS must be greater than zero".to_string());
        }

        if self.daily_request_limit == 0 {
            return Err("DAILY_REQUEST_LIMIT must be greater than zero".to_string());
        }

        if self.monthly_budget_usd.is_nan() || self.monthly_budget_usd <= 0.0 {
            return Err("MONTHLY_BUDGET_USD must be positive".to_string());
        }

        if self.max_compare_species < 2 {
            return Err("MAX_COMPARE_SPECIES must be at least 2".to_string());
        }

        if self.anthropic_api_key_var.trim().is_empty() {
            return Err("ANTHROPIC_API_KEY_VAR must name an environment variable".to_string());
        }

        self.research_profile().map(|_| ())
    }
}
