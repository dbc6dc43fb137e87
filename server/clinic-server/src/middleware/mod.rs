//! Middleware and extractors for request processing

pub mod extractors;
pub mod request_context;

use std::time::Instant;

use axum::{
    extract::Request,
    http::{header, HeaderName, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};

pub use extractors::JsonBody;
pub use request_context::{RequestContext, REQUEST_ID_HEADER};

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// Create CORS layer for the application
///
/// The clinic front end is served from the hosting platform's own origin,
/// so any origin is accepted.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
