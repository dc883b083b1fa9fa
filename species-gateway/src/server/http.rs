//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Request bodies are
//! collected up front so routing itself is a plain async function of
//! method, path and body.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use species_agent::{
    AnthropicBackend, ApiKeySource, LlmBackend, RelayBackend, ResearchService, UsageLedger,
};

use crate::config::Args;
use crate::routes;
use crate::types::GatewayError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const RESEARCH_PATHS: [&str; 3] = [
    "/api/research",
    "/research-species",
    "/.netlify/functions/research-species",
];
const COMPARE_PATH: &str = "/api/research/compare";
const CONTRIBUTION_PATHS: [&str; 2] = [
    "/api/contributions",
    "/.netlify/functions/submit-contribution",
];
const BUDGET_NOTIFY_PATHS: [&str; 2] = [
    "/api/budget/notify",
    "/.netlify/functions/budget-notification",
];

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Research pipeline with its backends and usage ledger
    pub service: ResearchService,
    /// Where the Anthropic key is read from, for health reporting
    pub api_key: ApiKeySource,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration: Anthropic first, then the optional relay.
    pub fn new(args: Args) -> Result<Self, GatewayError> {
        let config = args.service_config().map_err(GatewayError::Config)?;

        let mut backends: Vec<Arc<dyn LlmBackend>> = vec![Arc::new(AnthropicBackend::new(
            args.anthropic_base_url.as_str(),
            args.api_key(),
            &config.profile.params,
        )?)];
        if let Some(url) = args.relay() {
            backends.push(Arc::new(RelayBackend::new(url, args.relay_timeout())?));
        }

        let ledger = Arc::new(UsageLedger::in_memory(args.budget_limits()));
        let service = ResearchService::new(backends, ledger).with_config(config);
        Ok(Self::with_service(args, service))
    }

    /// Wrap an already-built service
    pub fn with_service(args: Args, service: ResearchService) -> Self {
        Self {
            api_key: args.api_key(),
            args,
            service,
            started_at: Instant::now(),
        }
    }

    pub fn with_api_key(mut self, api_key: ApiKeySource) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Species gateway listening on {}", state.args.listen);
    info!("Backends: {}", state.service.backend_ids().join(", "));

    if !state.api_key.is_present() {
        warn!(
            "{} is not set - research will answer with fallback profiles",
            state.args.anthropic_api_key_var
        );
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Read the body and dispatch
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let status = if e.downcast_ref::<LengthLimitError>().is_some() {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            warn!(error = %e, "Failed to read request body");
            return Ok(to_boxed(routes::error_response(
                status,
                "Failed to read request body",
            )));
        }
    };

    let response = route(state, method.clone(), &path, body).await;
    info!(
        "[{}] {} {} -> {}",
        addr,
        method,
        path,
        response.status().as_u16()
    );

    Ok(to_boxed(response))
}

/// Route a request with an already-collected body
pub async fn route(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    if method == Method::OPTIONS {
        return routes::preflight_response();
    }

    match (method, path) {
        (Method::POST, p) if RESEARCH_PATHS.contains(&p) => {
            routes::handle_research(&state, &body).await
        }
        (Method::POST, COMPARE_PATH) => routes::handle_compare(&state, &body).await,
        (Method::POST, p) if CONTRIBUTION_PATHS.contains(&p) => routes::handle_contribution(&body),
        (Method::POST, p) if BUDGET_NOTIFY_PATHS.contains(&p) => {
            routes::handle_budget_notification(&body)
        }
        (Method::GET, "/api/budget") => routes::budget_status(&state).await,
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),
        (Method::GET, "/version") => routes::version_info(),

        // Known POST-only endpoints
        (_, p) if RESEARCH_PATHS.contains(&p)
            || p == COMPARE_PATH
            || CONTRIBUTION_PATHS.contains(&p)
            || BUDGET_NOTIFY_PATHS.contains(&p) =>
        {
            routes::method_not_allowed()
        }

        (_, p) => routes::not_found_response(p),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}
