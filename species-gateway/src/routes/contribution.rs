//! Community contribution route
//!
//! - `POST /api/contributions`
//! - `POST /.netlify/functions/submit-contribution`
//!
//! Contributions are validated and logged for moderation; nothing is stored.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{json_response, parse_body, timestamp};

/// A knowledge submission about a species
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(default)]
    pub contributor_name: Option<String>,
    #[serde(default)]
    pub contributor_email: Option<String>,
    #[serde(default)]
    pub species_name: Option<String>,
    /// Free-form fields (observation, sources, tradition, ...)
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl Contribution {
    /// Name, email and species are all present and non-blank
    pub fn is_complete(&self) -> bool {
        present(&self.contributor_name)
            && present(&self.contributor_email)
            && present(&self.species_name)
    }
}

/// Handle a contribution POST
pub fn handle_contribution(body: &Bytes) -> Response<Full<Bytes>> {
    let contribution: Contribution = match parse_body(body) {
        Ok(contribution) => contribution,
        Err(response) => return response,
    };

    if !contribution.is_complete() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({ "error": "Missing required fields" }),
        );
    }

    info!(
        species = contribution.species_name.as_deref().unwrap_or_default(),
        contributor = contribution.contributor_name.as_deref().unwrap_or_default(),
        fields = contribution.details.len(),
        "New contribution received"
    );

    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "message": "Contribution submitted for moderation",
            "timestamp": timestamp(),
        }),
    )
}
