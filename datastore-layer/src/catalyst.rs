use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{DatastoreError, DatastoreResult};
use crate::query::Query;
use crate::row::{Row, RowId, ROW_ID};
use crate::store::{Datastore, QueryService, RowStore};
use crate::zcql;

/// Connection settings for a Catalyst project
#[derive(Debug, Clone)]
pub struct CatalystConfig {
    /// API origin, e.g. "https://api.catalyst.zoho.in"
    pub base_url: String,
    pub project_id: String,
    /// OAuth access token sent as `Zoho-oauthtoken`
    pub access_token: String,
    pub timeout: Duration,
}

impl CatalystConfig {
    pub fn validate(&self) -> DatastoreResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(DatastoreError::ConfigurationError(
                "Catalyst base_url is required".to_string(),
            ));
        }
        if self.project_id.trim().is_empty() {
            return Err(DatastoreError::ConfigurationError(
                "Catalyst project_id is required".to_string(),
            ));
        }
        if self.access_token.trim().is_empty() {
            return Err(DatastoreError::ConfigurationError(
                "Catalyst access_token is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Standard Catalyst response envelope
#[derive(Debug, Deserialize)]
struct CatalystEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Catalyst data store and ZCQL query service over HTTPS
pub struct CatalystDatastore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl CatalystDatastore {
    pub fn new(config: CatalystConfig) -> DatastoreResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DatastoreError::ConnectionFailed(format!("HTTP client error: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id,
            access_token: config.access_token,
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/baas/v1/project/{}/{}",
            self.base_url,
            self.project_id,
            path.trim_start_matches('/')
        )
    }

    fn row_url(&self, table: &str) -> String {
        self.project_url(&format!("table/{table}/row"))
    }

    fn auth_header(&self) -> String {
        format!("Zoho-oauthtoken {}", self.access_token)
    }

    async fn read_envelope(
        &self,
        response: reqwest::Response,
        table: &str,
    ) -> DatastoreResult<Value> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DatastoreError::RowNotFound {
                table: table.to_string(),
                row_id: String::new(),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(table, %status, "Catalyst request failed");
            return Err(DatastoreError::WriteRejected {
                table: table.to_string(),
                message: format!("Catalyst error {status}: {error_text}"),
            });
        }

        let envelope: CatalystEnvelope = response.json().await?;
        if matches!(envelope.status.as_deref(), Some(s) if s != "success") {
            return Err(DatastoreError::UnexpectedResponse(format!(
                "status {:?} for table {}",
                envelope.status, table
            )));
        }
        Ok(envelope.data)
    }

    /// Row APIs answer with an array of affected rows
    fn first_row(table: &str, data: Value) -> DatastoreResult<Row> {
        let value = match data {
            Value::Array(items) => items.into_iter().next(),
            other @ Value::Object(_) => Some(other),
            _ => None,
        };
        match value {
            Some(Value::Object(map)) => Ok(Row::from(map)),
            _ => Err(DatastoreError::UnexpectedResponse(format!(
                "no row returned for table {table}"
            ))),
        }
    }

    async fn run_zcql(&self, table: &str, sql: String) -> DatastoreResult<Vec<Value>> {
        debug!(table, sql = %sql, "Executing ZCQL");
        let response = self
            .client
            .post(self.project_url("query"))
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "query": sql }))
            .send()
            .await
            .map_err(|e| DatastoreError::QueryFailed(format!("Catalyst request error: {e}")))?;

        match self.read_envelope(response, table).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(DatastoreError::UnexpectedResponse(format!(
                "ZCQL result is not a list: {other}"
            ))),
        }
    }
}

#[async_trait]
impl RowStore for CatalystDatastore {
    async fn insert(&self, table: &str, fields: Row) -> DatastoreResult<Row> {
        let response = self
            .client
            .post(self.row_url(table))
            .header("Authorization", self.auth_header())
            .json(&vec![fields])
            .send()
            .await?;

        let data = self.read_envelope(response, table).await?;
        let row = Self::first_row(table, data)?;
        debug!(table, row_id = ?row.row_id(), "Inserted row");
        Ok(row)
    }

    async fn update(&self, table: &str, row_id: &RowId, fields: Row) -> DatastoreResult<Row> {
        let mut fields = fields;
        fields.set(ROW_ID, row_id.to_value());

        let response = self
            .client
            .put(self.row_url(table))
            .header("Authorization", self.auth_header())
            .json(&vec![fields])
            .send()
            .await?;

        let data = self.read_envelope(response, table).await.map_err(|e| match e {
            DatastoreError::RowNotFound { table, .. } => DatastoreError::RowNotFound {
                table,
                row_id: row_id.to_string(),
            },
            other => other,
        })?;
        Self::first_row(table, data)
    }

    async fn delete(&self, table: &str, row_id: &RowId) -> DatastoreResult<()> {
        let url = format!("{}/{}", self.row_url(table), row_id);
        let response = self
            .client
            .delete(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        self.read_envelope(response, table).await.map_err(|e| match e {
            DatastoreError::RowNotFound { table, .. } => DatastoreError::RowNotFound {
                table,
                row_id: row_id.to_string(),
            },
            other => other,
        })?;
        Ok(())
    }
}

#[async_trait]
impl QueryService for CatalystDatastore {
    async fn select(&self, query: &Query) -> DatastoreResult<Vec<Row>> {
        let table = query.table_name();
        let rows = self.run_zcql(table, zcql::render_select(query)).await?;
        Ok(rows
            .into_iter()
            .filter_map(|value| zcql::unwrap_table_row(table, value))
            .collect())
    }

    async fn count(&self, query: &Query) -> DatastoreResult<u64> {
        let table = query.table_name();
        let rows = self.run_zcql(table, zcql::render_count(query)).await?;
        match rows.first() {
            None => Ok(0),
            Some(first) => zcql::extract_count(first).ok_or_else(|| {
                DatastoreError::UnexpectedResponse(format!("no count in result: {first}"))
            }),
        }
    }
}

impl Datastore for CatalystDatastore {
    fn backend_name(&self) -> &'static str {
        "catalyst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CatalystConfig {
        CatalystConfig {
            base_url: "https://api.catalyst.example/".to_string(),
            project_id: "4000".to_string(),
            access_token: "token".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn missing_settings_are_rejected() {
        let mut cfg = config();
        cfg.project_id = " ".to_string();
        assert!(matches!(
            CatalystDatastore::new(cfg),
            Err(DatastoreError::ConfigurationError(_))
        ));
    }

    #[test]
    fn urls_are_built_from_project() {
        let store = CatalystDatastore::new(config()).unwrap();
        assert_eq!(
            store.row_url("Patient"),
            "https://api.catalyst.example/baas/v1/project/4000/table/Patient/row"
        );
        assert_eq!(
            store.project_url("/query"),
            "https://api.catalyst.example/baas/v1/project/4000/query"
        );
        assert_eq!(store.auth_header(), "Zoho-oauthtoken token");
    }

    #[test]
    fn first_row_accepts_list_or_object() {
        let row = CatalystDatastore::first_row(
            "Patient",
            serde_json::json!([{"ROWID": "5", "Name": "x"}]),
        )
        .unwrap();
        assert_eq!(row.row_id(), Some(RowId::from("5")));
        assert!(CatalystDatastore::first_row("Patient", serde_json::json!([])).is_err());
    }
}
