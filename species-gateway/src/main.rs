//! Species gateway - HTTP front end for species intelligence research

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use species_gateway::{
    config::{Args, LogFormat},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.default_log_filter().into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Species Intelligence Gateway");
    info!("  Perceive / Relate / Apply");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Model: {}", args.anthropic_model);
    info!("Prompt template: {}", args.prompt_template);
    info!("Upstream timeout: {}ms", args.request_timeout_ms);
    match args.relay() {
        Some(url) => info!("Relay: {} ({}ms)", url, args.relay_timeout_ms),
        None => info!("Relay: disabled"),
    }
    info!(
        "Budget: {} requests/day, ${:.2}/month ({})",
        args.daily_request_limit,
        args.monthly_budget_usd,
        if args.enforce_budget { "enforced" } else { "tracked only" }
    );
    info!("Client prompts: {}", if args.allow_client_prompt { "allowed" } else { "ignored" });
    info!("======================================");

    let state = Arc::new(AppState::new(args)?);
    server::run(state).await?;

    Ok(())
}
