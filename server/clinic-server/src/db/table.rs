use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreResult, Query, Row, RowId, ROW_ID};
use serde_json::Value;
use tracing::warn;

/// Handle on one named table of the datastore
#[derive(Clone)]
pub struct Table {
    store: Arc<dyn Datastore>,
    name: &'static str,
}

impl Table {
    pub fn new(store: Arc<dyn Datastore>, name: &'static str) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn query(&self) -> Query {
        Query::table(self.name)
    }

    /// First row whose `column` equals `value`
    pub async fn find_one(&self, column: &str, value: &str) -> DatastoreResult<Option<Row>> {
        self.store
            .select_one(&self.query().filter_eq(column, Value::from(value)))
            .await
    }

    /// First row whose `column` equals `value`, restricted to `columns`
    pub async fn find_one_columns(
        &self,
        columns: &[&str],
        column: &str,
        value: &str,
    ) -> DatastoreResult<Option<Row>> {
        self.store
            .select_one(
                &self
                    .query()
                    .select(columns)
                    .filter_eq(column, Value::from(value)),
            )
            .await
    }

    /// Every row whose `column` equals `value`, in storage order
    pub async fn find_all(&self, column: &str, value: &str) -> DatastoreResult<Vec<Row>> {
        self.store
            .select(&self.query().filter_eq(column, Value::from(value)))
            .await
    }

    /// Row ids of every row whose `column` equals `value`
    pub async fn row_ids(&self, column: &str, value: &str) -> DatastoreResult<Vec<RowId>> {
        let rows = self
            .store
            .select(
                &self
                    .query()
                    .select(&[ROW_ID])
                    .filter_eq(column, Value::from(value)),
            )
            .await?;
        Ok(rows.iter().filter_map(Row::row_id).collect())
    }

    pub async fn exists(&self, column: &str, value: &str) -> DatastoreResult<bool> {
        Ok(!self.row_ids(column, value).await?.is_empty())
    }

    pub async fn get(&self, row_id: &RowId) -> DatastoreResult<Option<Row>> {
        self.find_one(ROW_ID, row_id.as_str()).await
    }

    /// One page of rows restricted to `columns`
    pub async fn page(&self, columns: &[&str], page: u64, per_page: u64) -> DatastoreResult<Vec<Row>> {
        self.store
            .select(&self.query().select(columns).paginate(page, per_page))
            .await
    }

    pub async fn count(&self) -> DatastoreResult<u64> {
        self.store.count(&self.query()).await
    }

    pub async fn insert(&self, row: Row) -> DatastoreResult<Row> {
        self.store.insert(self.name, row).await
    }

    pub async fn update(&self, row_id: &RowId, row: Row) -> DatastoreResult<Row> {
        self.store.update(self.name, row_id, row).await
    }

    pub async fn delete(&self, row_id: &RowId) -> DatastoreResult<()> {
        self.store.delete(self.name, row_id).await
    }

    /// Delete each row independently, returning the ids that were removed
    pub async fn delete_each(&self, row_ids: &[RowId]) -> Vec<RowId> {
        let mut deleted = Vec::with_capacity(row_ids.len());
        for row_id in row_ids {
            match self.delete(row_id).await {
                Ok(()) => deleted.push(row_id.clone()),
                Err(e) => warn!(
                    table = self.name,
                    row_id = %row_id,
                    error = %e,
                    "Failed to delete row"
                ),
            }
        }
        deleted
    }
}
