//! Single-species research route
//!
//! - `POST /api/research`
//! - `POST /research-species`
//! - `POST /.netlify/functions/research-species`
//!
//! Body: `{ species, prompt?, options? }`. Upstream failures still answer
//! 200 with a fallback profile and a `note`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use species_agent::{
    BudgetStatus, IntelligenceMetrics, MapPoint, ResearchOptions, ResearchRequest,
    SpeciesProfile, ServiceError,
};
use species_agent::service::ResearchOutcome;

use super::{json_response, parse_body, service_error_response, timestamp};
use crate::server::AppState;

/// Incoming research body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResearchBody {
    #[serde(default)]
    species: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    options: Option<ResearchOptions>,
}

/// Successful research response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse {
    pub success: bool,
    pub request_id: String,
    pub response: SpeciesProfile,
    pub metrics: IntelligenceMetrics,
    pub map_point: MapPoint,
    pub budget: BudgetStatus,
    /// Why fallback text was used, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub duration_ms: u64,
    pub timestamp: String,
}

impl From<ResearchOutcome> for ResearchResponse {
    fn from(outcome: ResearchOutcome) -> Self {
        Self {
            success: true,
            request_id: outcome.request_id,
            note: outcome.profile.fallback_reason.clone(),
            response: outcome.profile,
            metrics: outcome.metrics,
            map_point: outcome.map_point,
            budget: outcome.budget,
            backend: outcome.backend_id,
            duration_ms: outcome.duration_ms,
            timestamp: timestamp(),
        }
    }
}

/// Handle a research POST
pub async fn handle_research(state: &AppState, body: &Bytes) -> Response<Full<Bytes>> {
    let body: ResearchBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let request = match ResearchRequest::new(body.species.unwrap_or_default()) {
        Ok(request) => request.with_options(body.options.unwrap_or_default()),
        Err(e) => return service_error_response(&ServiceError::from(e)),
    };
    let request = match body.prompt {
        Some(prompt) => request.with_prompt(prompt),
        None => request,
    };

    match state.service.research(request).await {
        Ok(outcome) => {
            let response = ResearchResponse::from(outcome);
            info!(
                request_id = %response.request_id,
                species = %response.response.species,
                research_backed = response.response.research_backed,
                "Research served"
            );
            json_response(StatusCode::OK, &response)
        }
        Err(e) => service_error_response(&e),
    }
}
