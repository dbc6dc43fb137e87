//! Request-scoped context for tracing
//!
//! Every handler that writes to the datastore receives a [`RequestContext`]
//! so its log and audit events can be correlated with the incoming request.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request context containing tracing information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Unique request ID for tracing
    pub request_id: String,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Request timestamp
    pub timestamp: DateTime<Utc>,
}

impl RequestContext {
    /// Create a new request context with generated request ID
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            user_agent: None,
            timestamp: Utc::now(),
        }
    }

    /// Create from headers, reusing the caller's request id when present
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            user_agent,
            timestamp: Utc::now(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
