//! Health check endpoints

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{json_response, timestamp};
use crate::server::AppState;

/// Liveness response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since the gateway started
    pub uptime: u64,
    /// Whether the Anthropic API key is currently set. The key is never echoed.
    pub has_api_key: bool,
    /// Configured backends in call order
    pub backends: Vec<String>,
    pub prompt_template: String,
    pub timestamp: String,
}

/// Handle liveness probe (/health, /healthz)
///
/// Always 200 while the process is serving. A missing key is reported,
/// not treated as unhealthy.
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        has_api_key: state.api_key.is_present(),
        backends: state.service.backend_ids(),
        prompt_template: state.service.config().profile.template.name.clone(),
        timestamp: timestamp(),
    };

    json_response(StatusCode::OK, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "species-gateway",
    };

    json_response(StatusCode::OK, &response)
}
