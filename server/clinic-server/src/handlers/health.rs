use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{api_success, ApiError, ApiResult};
use crate::server::ClinicServer;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status
    #[schema(example = "healthy")]
    pub status: String,
    /// Service version
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Active datastore backend
    #[schema(example = "memory")]
    pub datastore: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
}

/// Health check handler
#[utoipa::path(
    get,
    path = crate::routes::paths::health::HEALTH,
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(server): State<ClinicServer>) -> ApiResult<HealthResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        datastore: server.datastore.backend_name().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok(axum::Json(api_success(response)))
}

/// Fallback for unknown routes
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
