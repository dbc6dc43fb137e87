use async_trait::async_trait;

use crate::error::DatastoreResult;
use crate::query::Query;
use crate::row::{Row, RowId};

/// Single-row writes against the managed store
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Insert a row and return it as stored, including `ROWID` and `CREATEDTIME`
    async fn insert(&self, table: &str, fields: Row) -> DatastoreResult<Row>;

    /// Overwrite the given columns of an existing row
    async fn update(&self, table: &str, row_id: &RowId, fields: Row) -> DatastoreResult<Row>;

    async fn delete(&self, table: &str, row_id: &RowId) -> DatastoreResult<()>;
}

/// Read-only filter / count / order / page access
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn select(&self, query: &Query) -> DatastoreResult<Vec<Row>>;

    /// Number of rows matching the query's filters
    async fn count(&self, query: &Query) -> DatastoreResult<u64>;

    /// First matching row, if any
    async fn select_one(&self, query: &Query) -> DatastoreResult<Option<Row>> {
        let rows = self.select(&query.clone().with_limit(1)).await?;
        Ok(rows.into_iter().next())
    }
}

/// A complete backend: both surfaces plus a name for diagnostics
pub trait Datastore: RowStore + QueryService {
    fn backend_name(&self) -> &'static str;
}
