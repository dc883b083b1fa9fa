//! HTTP routes for the species gateway
//!
//! Every response carries `Access-Control-Allow-Origin: *`; the browser
//! client is served from a different origin.

pub mod budget;
pub mod compare;
pub mod contribution;
pub mod health;
pub mod research;

pub use budget::{budget_status, handle_budget_notification};
pub use compare::handle_compare;
pub use contribution::{handle_contribution, Contribution};
pub use health::{health_check, version_info};
pub use research::{handle_research, ResearchResponse};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use species_agent::ServiceError;
use tracing::{debug, error};

/// Add the CORS origin header
fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Create JSON response
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(data)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Serialization failed"}"#.to_string());

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

/// Create error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &serde_json::json!({
            "success": false,
            "error": message,
        }),
    )
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = with_cors(Response::new(Full::new(Bytes::new())));
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

/// Known path, wrong method
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed" }),
    )
}

/// Not found response
pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}

/// Parse a JSON request body, or produce the 400 to send back.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response<Full<Bytes>>> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejecting request body");
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON body")
    })
}

/// Map a service failure to its HTTP response
pub(crate) fn service_error_response(err: &ServiceError) -> Response<Full<Bytes>> {
    match err {
        ServiceError::InvalidRequest(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        ServiceError::Configuration(details) => {
            error!(details = %details, "Research service misconfigured");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({
                    "success": false,
                    "error": "Research service is not configured",
                    "details": details,
                }),
            )
        }
        ServiceError::BudgetExhausted(e) => {
            error_response(StatusCode::TOO_MANY_REQUESTS, &e.to_string())
        }
    }
}

/// Current time as RFC 3339
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
