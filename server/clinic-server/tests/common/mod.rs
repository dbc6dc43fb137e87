//! Shared helpers for the HTTP-level tests
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use clinic_server::config::AppConfig;
use clinic_server::services::{RecordingAudit, StockLocks};
use clinic_server::{create_app, ClinicServer};
use datastore_layer::{InMemoryDatastore, Row, RowStore};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router plus handles on its datastore, audit sink and stock locks
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryDatastore,
    pub audit: Arc<RecordingAudit>,
    pub stock_locks: Arc<StockLocks>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryDatastore::new();
        let audit = Arc::new(RecordingAudit::new());
        let server = ClinicServer::with_datastore(AppConfig::default(), Arc::new(store.clone()))
            .with_audit(audit.clone());
        let stock_locks = server.stock_locks.clone();
        Self {
            router: create_app(server),
            store,
            audit,
            stock_locks,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Insert a patient row directly and return its UUID
    pub async fn seed_patient(&self, uuid: &str, phone: &str) -> String {
        self.store
            .insert(
                "Patient",
                Row::new()
                    .with("Name", json!("Asha Rao"))
                    .with("Phonenumber", json!(phone))
                    .with("UUID", json!(uuid)),
            )
            .await
            .unwrap();
        uuid.to_string()
    }

    /// Insert a stock row directly
    pub async fn seed_stock(&self, name: &str, quantity: i64) {
        self.store
            .insert(
                "MedicineStock",
                Row::new()
                    .with("Name", json!(name))
                    .with("Quantity", json!(quantity))
                    .with("UUID", json!(format!("med-{}", name))),
            )
            .await
            .unwrap();
    }

    /// Quantity on hand of a medicine, read straight from the store
    pub fn stock_of(&self, name: &str) -> Option<Value> {
        self.store
            .rows("MedicineStock")
            .into_iter()
            .find(|row| row.get("Name") == Some(&json!(name)))
            .and_then(|row| row.get("Quantity").cloned())
    }
}
