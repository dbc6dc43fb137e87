use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreResult, Row, RowId};

use super::table::Table;

pub const PRESCRIBED_MEDICINE_TABLE: &str = "PrescribedMedicine";

/// Columns a prescribed medicine update may overwrite
pub const PRESCRIBED_MEDICINE_UPDATABLE_COLUMNS: [&str; 4] =
    ["MedicineName", "frequency", "Duration", "timing"];

/// Medicine lines of a prescription, linked by `PrescriptionUUID`
#[derive(Clone)]
pub struct PrescribedMedicineRepository {
    table: Table,
}

impl PrescribedMedicineRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            table: Table::new(store, PRESCRIBED_MEDICINE_TABLE),
        }
    }

    pub async fn for_prescription(&self, prescription_uuid: &str) -> DatastoreResult<Vec<Row>> {
        self.table.find_all("PrescriptionUUID", prescription_uuid).await
    }

    pub async fn row_ids_for_prescription(&self, prescription_uuid: &str) -> DatastoreResult<Vec<RowId>> {
        self.table.row_ids("PrescriptionUUID", prescription_uuid).await
    }

    pub async fn get(&self, row_id: &RowId) -> DatastoreResult<Option<Row>> {
        self.table.get(row_id).await
    }

    pub async fn insert(&self, row: Row) -> DatastoreResult<Row> {
        self.table.insert(row).await
    }

    pub async fn update(&self, row_id: &RowId, updates: Row) -> DatastoreResult<Row> {
        self.table.update(row_id, updates).await
    }

    pub async fn delete(&self, row_id: &RowId) -> DatastoreResult<()> {
        self.table.delete(row_id).await
    }

    pub async fn delete_each(&self, row_ids: &[RowId]) -> Vec<RowId> {
        self.table.delete_each(row_ids).await
    }
}
