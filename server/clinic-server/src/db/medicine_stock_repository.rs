//! Medicine stock ledger
//!
//! Stock rows are keyed by their unique `Name`, which is also how prescribed
//! medicine lines refer to them. The store offers no increment primitive, so
//! quantities are always written as absolute values.

use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreError, DatastoreResult, Row, RowId, ROW_ID};
use serde_json::Value;

use super::table::Table;
use crate::utils::coerce::to_int;

pub const MEDICINE_STOCK_TABLE: &str = "MedicineStock";

/// Columns returned by the inventory listing
pub const MEDICINE_LIST_COLUMNS: [&str; 8] = [
    ROW_ID,
    "Name",
    "Dosage",
    "Quantity",
    "Category",
    "Price",
    "ManufacturerName",
    "UUID",
];

/// Columns an inventory update may overwrite
pub const MEDICINE_UPDATABLE_COLUMNS: [&str; 6] = [
    "Dosage",
    "Quantity",
    "Category",
    "Price",
    "ManufacturerName",
    "Name",
];

/// Quantity on hand for one medicine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub row_id: RowId,
    pub name: String,
    pub quantity: i64,
}

impl StockLevel {
    /// Read a stock level from a row; a missing or non-numeric quantity counts as zero
    pub fn from_row(name: &str, row: &Row) -> DatastoreResult<Self> {
        let row_id = row.row_id().ok_or_else(|| {
            DatastoreError::UnexpectedResponse(format!(
                "{} row for {} has no ROWID",
                MEDICINE_STOCK_TABLE, name
            ))
        })?;
        let quantity = row
            .get("Quantity")
            .and_then(|value| to_int(value).ok().flatten())
            .unwrap_or(0);
        Ok(Self {
            row_id,
            name: name.to_string(),
            quantity,
        })
    }
}

#[derive(Clone)]
pub struct MedicineStockRepository {
    table: Table,
}

impl MedicineStockRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            table: Table::new(store, MEDICINE_STOCK_TABLE),
        }
    }

    pub async fn find_by_name(&self, name: &str) -> DatastoreResult<Option<Row>> {
        self.table.find_one("Name", name).await
    }

    pub async fn name_exists(&self, name: &str) -> DatastoreResult<bool> {
        self.table.exists("Name", name).await
    }

    /// Current quantity on hand of the medicine with this exact name
    pub async fn stock_level(&self, name: &str) -> DatastoreResult<Option<StockLevel>> {
        let row = self
            .table
            .find_one_columns(&[ROW_ID, "Name", "Quantity"], "Name", name)
            .await?;
        row.map(|row| StockLevel::from_row(name, &row)).transpose()
    }

    /// Overwrite the quantity on hand
    pub async fn set_quantity(&self, row_id: &RowId, quantity: i64) -> DatastoreResult<()> {
        self.table
            .update(row_id, Row::new().with("Quantity", Value::from(quantity)))
            .await?;
        Ok(())
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> DatastoreResult<Option<Row>> {
        self.table.find_one("UUID", uuid).await
    }

    /// Every inventory row carrying `uuid`
    pub async fn find_all_by_uuid(&self, uuid: &str) -> DatastoreResult<Vec<Row>> {
        self.table.find_all("UUID", uuid).await
    }

    pub async fn insert(&self, row: Row) -> DatastoreResult<Row> {
        self.table.insert(row).await
    }

    pub async fn update(&self, row_id: &RowId, updates: Row) -> DatastoreResult<Row> {
        self.table.update(row_id, updates).await
    }

    pub async fn delete_each(&self, row_ids: &[RowId]) -> Vec<RowId> {
        self.table.delete_each(row_ids).await
    }

    pub async fn page(&self, page: u64, per_page: u64) -> DatastoreResult<Vec<Row>> {
        self.table.page(&MEDICINE_LIST_COLUMNS, page, per_page).await
    }

    pub async fn count(&self) -> DatastoreResult<u64> {
        self.table.count().await
    }
}
