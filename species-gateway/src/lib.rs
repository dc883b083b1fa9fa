//! Species Gateway - HTTP front end for species intelligence research
//!
//! Serves the research agent over plain HTTP/1 with permissive CORS, for
//! the browser client and for the legacy serverless function paths.
//!
//! ## Routes
//!
//! - **Research**: single-species profiles with metrics and map position
//! - **Compare**: sequential multi-species research plus comparison summary
//! - **Contributions**: community knowledge submissions, logged for moderation
//! - **Budget**: usage snapshot and spend alerts
//! - **Health**: liveness and build version

pub mod config;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{route, run, AppState};
pub use types::{GatewayError, Result};
