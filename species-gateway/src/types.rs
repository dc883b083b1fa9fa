//! Error types for the species gateway

use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend setup failed: {0}")]
    Backend(#[from] species_agent::LlmError),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
