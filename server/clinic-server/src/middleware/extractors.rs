//! Request body extractors
//!
//! Clients of this API send loosely shaped JSON. Handlers read fields by name
//! and apply their own coercion, so the body is taken as a plain JSON object.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde_json::{Map, Value};
use std::ops::Deref;

use crate::error::ApiError;

/// JSON object body that never rejects
///
/// A missing body, malformed JSON or a top-level value that is not an object
/// all yield an empty map, so required-field checks produce the usual
/// "Missing required field" response instead of a parser error.
#[derive(Debug, Clone, Default)]
pub struct JsonBody(pub Map<String, Value>);

impl JsonBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => JsonBody(map),
            _ => JsonBody::default(),
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Unable to read request body: {}", e)))?;
        Ok(JsonBody::from_bytes(&bytes))
    }
}

impl Deref for JsonBody {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
