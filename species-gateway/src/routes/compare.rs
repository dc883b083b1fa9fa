//! Multi-species comparison route (`POST /api/research/compare`)
//!
//! Body: `{ species: [name, ...], options? }`. Species are researched one
//! after another, then compared.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use species_agent::{Comparison, ResearchOptions};

use super::{json_response, parse_body, service_error_response, timestamp, ResearchResponse};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareBody {
    #[serde(default)]
    species: Vec<String>,
    #[serde(default)]
    options: Option<ResearchOptions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub success: bool,
    pub results: Vec<ResearchResponse>,
    pub comparison: Comparison,
    pub timestamp: String,
}

/// Handle a comparison POST
pub async fn handle_compare(state: &AppState, body: &Bytes) -> Response<Full<Bytes>> {
    let body: CompareBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let options = body.options.unwrap_or_default();
    match state.service.compare_species(body.species.as_slice(), options).await {
        Ok(outcome) => {
            info!(species = outcome.outcomes.len(), "Comparison served");
            json_response(
                StatusCode::OK,
                &CompareResponse {
                    success: true,
                    results: outcome.outcomes.into_iter().map(ResearchResponse::from).collect(),
                    comparison: outcome.comparison,
                    timestamp: timestamp(),
                },
            )
        }
        Err(e) => service_error_response(&e),
    }
}
