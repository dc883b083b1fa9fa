//! Budget routes
//!
//! - `GET /api/budget` - current usage snapshot
//! - `POST /api/budget/notify`, `POST /.netlify/functions/budget-notification`
//!   - log a spend alert reported by the client and echo it back

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use tracing::warn;

use species_agent::BudgetNotification;

use super::{json_response, parse_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotifyBody {
    current_spend: f64,
    budget_percent: f64,
    monthly_budget: f64,
}

/// Handle GET /api/budget
pub async fn budget_status(state: &AppState) -> Response<Full<Bytes>> {
    let status = state.service.budget_status().await;
    json_response(StatusCode::OK, &status)
}

/// Handle a budget notification POST
pub fn handle_budget_notification(body: &Bytes) -> Response<Full<Bytes>> {
    let body: NotifyBody = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let notification =
        BudgetNotification::new(body.current_spend, body.budget_percent, body.monthly_budget);
    warn!(
        budget_percent = notification.budget_percent,
        current_spend = notification.current_spend,
        "Budget alert: {}",
        notification.message
    );

    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "notification": notification,
        }),
    )
}
