//! Patient table access
//!
//! Patients are addressed by their generated `UUID` and, for the front desk,
//! by their unique `Phonenumber`.

use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreResult, Row, RowId, ROW_ID};

use super::table::Table;

pub const PATIENT_TABLE: &str = "Patient";

/// Columns returned by the patient listing
pub const PATIENT_LIST_COLUMNS: [&str; 12] = [
    ROW_ID,
    "Name",
    "Gender",
    "Age",
    "Profession",
    "Weight",
    "Height",
    "Phonenumber",
    "MedicialHistory",
    "UUID",
    "AdharNumber",
    "Address",
];

/// Columns a patient update may overwrite
pub const PATIENT_UPDATABLE_COLUMNS: [&str; 8] = [
    "Name",
    "Gender",
    "Age",
    "Profession",
    "Weight",
    "Height",
    "Phonenumber",
    "MedicialHistory",
];

#[derive(Clone)]
pub struct PatientRepository {
    table: Table,
}

impl PatientRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            table: Table::new(store, PATIENT_TABLE),
        }
    }

    pub async fn find_by_phone(&self, phone: &str) -> DatastoreResult<Option<Row>> {
        self.table.find_one("Phonenumber", phone).await
    }

    pub async fn phone_exists(&self, phone: &str) -> DatastoreResult<bool> {
        self.table.exists("Phonenumber", phone).await
    }

    pub async fn row_id_by_phone(&self, phone: &str) -> DatastoreResult<Option<RowId>> {
        Ok(self.table.row_ids("Phonenumber", phone).await?.into_iter().next())
    }

    /// Whether a patient with this UUID exists
    pub async fn exists(&self, uuid: &str) -> DatastoreResult<bool> {
        self.table.exists("UUID", uuid).await
    }

    pub async fn row_ids_by_uuid(&self, uuid: &str) -> DatastoreResult<Vec<RowId>> {
        self.table.row_ids("UUID", uuid).await
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
        self.table.page(&PATIENT_LIST_COLUMNS, page, per_page).await
    }

    pub async fn count(&self) -> DatastoreResult<u64> {
        self.table.count().await
    }
}
