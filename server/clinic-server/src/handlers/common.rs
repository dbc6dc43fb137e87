//! Helpers shared by the table handlers

use datastore_layer::{DatastoreError, Row, RowId, ROW_ID};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

/// Map a datastore failure to a 500 with a fixed message, logging the cause
pub fn internal_error(message: &'static str) -> impl FnOnce(DatastoreError) -> ApiError {
    move |e| {
        error!(error = %e, "{}", message);
        ApiError::internal(message)
    }
}

/// Row count used for paging metadata; a failed count reports zero
pub fn total_or_zero(result: Result<u64, DatastoreError>, table: &str) -> u64 {
    result.unwrap_or_else(|e| {
        warn!(table, error = %e, "Failed to fetch total count");
        0
    })
}

/// Rebuild a row with a fixed column set, exposing `ROWID` under `id_key`
///
/// Columns the store did not return come back as `null`.
pub fn listing_item(row: &Row, id_key: &str, columns: &[&str]) -> Row {
    let id = row
        .row_id()
        .map(|id| id.to_value())
        .unwrap_or(Value::Null);
    columns
        .iter()
        .filter(|column| **column != ROW_ID)
        .fold(Row::new().with(id_key, id), |item, column| {
            item.with(*column, row.get(column).cloned().unwrap_or(Value::Null))
        })
}

/// Result of a delete-by-UUID
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRows {
    pub deleted_row_ids: Vec<RowId>,
}

/// `?UUID=` (or `?uuid=`) query parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UuidQuery {
    #[serde(rename = "UUID")]
    pub upper: Option<String>,
    #[serde(rename = "uuid")]
    pub lower: Option<String>,
}

impl UuidQuery {
    pub fn uuid(&self) -> Option<&str> {
        first_non_empty(&self.upper, &self.lower)
    }
}

/// First of two aliased query parameters that carries a value
pub fn first_non_empty<'a>(first: &'a Option<String>, second: &'a Option<String>) -> Option<&'a str> {
    [first, second]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_item_renames_row_id_and_fills_missing_columns() {
        let row = Row::new()
            .with(ROW_ID, json!("17"))
            .with("Name", json!("Zinc"));
        let item = listing_item(&row, "medicineId", &[ROW_ID, "Name", "Quantity"]);
        assert_eq!(
            item.into_value(),
            json!({"medicineId": "17", "Name": "Zinc", "Quantity": null})
        );
    }

    #[test]
    fn uuid_query_prefers_upper_case_key() {
        let query = UuidQuery {
            upper: Some("A".to_string()),
            lower: Some("b".to_string()),
        };
        assert_eq!(query.uuid(), Some("A"));

        let query = UuidQuery {
            upper: Some(String::new()),
            lower: Some("b".to_string()),
        };
        assert_eq!(query.uuid(), Some("b"));
        assert_eq!(UuidQuery::default().uuid(), None);
    }

    #[test]
    fn failed_count_reports_zero() {
        let failed = Err(DatastoreError::QueryFailed("timeout".to_string()));
        assert_eq!(total_or_zero(failed, "Patient"), 0);
        assert_eq!(total_or_zero(Ok(3), "Patient"), 3);
    }
}
