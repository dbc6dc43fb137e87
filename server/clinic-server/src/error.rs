use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use datastore_layer::DatastoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Header carrying the correlation id of a failed request
pub const ERROR_ID_HEADER: &str = "x-error-id";

/// Failure envelope returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Always `failure`
    pub status: String,
    /// Human-readable error message
    pub error: String,
    /// Underlying cause, present for internal failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Success envelope returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always `success`
    pub status: String,
    pub data: T,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },

    #[error("Datastore operation failed")]
    Datastore(#[from] DatastoreError),
}

impl ApiError {
    /// Create a validation error (missing or malformed input)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Validation error for a missing required field
    pub fn missing_field(field: &str) -> Self {
        Self::validation(format!("Missing required field: {}", field))
    }

    /// Create a bad request error (well-formed input referencing missing data)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an internal error without details
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            details: None,
        }
    }

    /// Create an internal error carrying the underlying cause
    pub fn internal_with_details(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Datastore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Internal { .. } => "internal_error",
            ApiError::Datastore(_) => "datastore_error",
        }
    }

    /// Underlying cause exposed in the `details` field
    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::Internal { details, .. } => details.clone(),
            ApiError::Datastore(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();
        let details = self.details();

        // Log the error with correlation ID
        error!(
            error_id = %error_id,
            error_type = %self.error_type(),
            status_code = %status_code.as_u16(),
            error = %self,
            details = details.as_deref().unwrap_or(""),
            "API error occurred"
        );

        let body = ApiErrorResponse {
            status: "failure".to_string(),
            error: self.to_string(),
            details,
        };

        let mut response = (status_code, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&error_id) {
            response.headers_mut().insert(ERROR_ID_HEADER, value);
        }
        response
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        status: "success".to_string(),
        data,
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
