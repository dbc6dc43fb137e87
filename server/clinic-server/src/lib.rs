//! Clinic server
//!
//! HTTP API for a small clinic: patient registry, prescriptions with their
//! medicine lines, and the medicine stock ledger. `POST /prescription/save`
//! writes a prescription and deducts stock as one unit, rolling back on
//! failure.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::*;
pub use server::ClinicServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main application router with all routes and middleware
pub fn create_app(server: ClinicServer) -> Router {
    let request_timeout = server.config.request_timeout();

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
