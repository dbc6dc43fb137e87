use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreResult, Row, RowId, CREATED_TIME, ROW_ID};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::table::Table;

pub const PRESCRIPTION_TABLE: &str = "Prescription";

/// Columns returned by the prescription listing
pub const PRESCRIPTION_LIST_COLUMNS: [&str; 7] = [
    ROW_ID,
    "UUID",
    "PatientUUID",
    "OutsideMedicines",
    "CurrentSymptoms",
    "fees",
    CREATED_TIME,
];

/// Columns a prescription update may overwrite
pub const PRESCRIPTION_UPDATABLE_COLUMNS: [&str; 4] =
    ["PatientUUID", "OutsideMedicines", "CurrentSymptoms", "fees"];

/// Header fields of a prescription, stored as the client sent them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionHeader {
    #[serde(rename = "PatientUUID")]
    #[schema(value_type = Object)]
    pub patient_uuid: Value,
    #[serde(rename = "OutsideMedicines")]
    #[schema(value_type = Object)]
    pub outside_medicines: Value,
    #[serde(rename = "CurrentSymptoms")]
    #[schema(value_type = Object)]
    pub current_symptoms: Value,
    #[schema(value_type = Object)]
    pub fees: Value,
}

impl PrescriptionHeader {
    /// Read the header fields from a request body; absent keys become `null`
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).cloned().unwrap_or(Value::Null);
        Self {
            patient_uuid: field("PatientUUID"),
            outside_medicines: field("OutsideMedicines"),
            current_symptoms: field("CurrentSymptoms"),
            fees: field("fees"),
        }
    }

    pub fn to_row(&self) -> Row {
        Row::new()
            .with("PatientUUID", self.patient_uuid.clone())
            .with("OutsideMedicines", self.outside_medicines.clone())
            .with("CurrentSymptoms", self.current_symptoms.clone())
            .with("fees", self.fees.clone())
    }
}

#[derive(Clone)]
pub struct PrescriptionRepository {
    table: Table,
    store: Arc<dyn Datastore>,
}

impl PrescriptionRepository {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            table: Table::new(store.clone(), PRESCRIPTION_TABLE),
            store,
        }
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> DatastoreResult<Option<Row>> {
        self.table.find_one("UUID", uuid).await
    }

    pub async fn row_id_by_uuid(&self, uuid: &str) -> DatastoreResult<Option<RowId>> {
        Ok(self.row_ids_by_uuid(uuid).await?.into_iter().next())
    }

    pub async fn row_ids_by_uuid(&self, uuid: &str) -> DatastoreResult<Vec<RowId>> {
        self.table.row_ids("UUID", uuid).await
    }

    pub async fn exists(&self, uuid: &str) -> DatastoreResult<bool> {
        self.table.exists("UUID", uuid).await
    }

    /// Insert a header under the given UUID
    pub async fn insert(&self, uuid: &str, header: &PrescriptionHeader) -> DatastoreResult<Row> {
        self.table
            .insert(header.to_row().with("UUID", Value::from(uuid)))
            .await
    }

    pub async fn update(&self, row_id: &RowId, updates: Row) -> DatastoreResult<Row> {
        self.table.update(row_id, updates).await
    }

    pub async fn delete_each(&self, row_ids: &[RowId]) -> Vec<RowId> {
        self.table.delete_each(row_ids).await
    }

    /// Every prescription of a patient, newest first
    pub async fn for_patient(&self, patient_uuid: &str) -> DatastoreResult<Vec<Row>> {
        let query = self
            .table
            .query()
            .filter_eq("PatientUUID", Value::from(patient_uuid))
            .order_by_created_desc();
        self.store.select(&query).await
    }

    pub async fn page(&self, page: u64, per_page: u64) -> DatastoreResult<Vec<Row>> {
        self.table.page(&PRESCRIPTION_LIST_COLUMNS, page, per_page).await
    }

    pub async fn count(&self) -> DatastoreResult<u64> {
        self.table.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_reads_missing_fields_as_null() {
        let body = json!({"PatientUUID": "pt-1", "fees": 300});
        let header = PrescriptionHeader::from_map(body.as_object().unwrap());
        assert_eq!(header.patient_uuid, json!("pt-1"));
        assert_eq!(header.fees, json!(300));
        assert_eq!(header.outside_medicines, Value::Null);

        let row = header.to_row();
        assert_eq!(row.get("CurrentSymptoms"), Some(&Value::Null));
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn header_serializes_with_column_names() {
        let header = PrescriptionHeader {
            patient_uuid: json!("pt-1"),
            ..Default::default()
        };
        let value = serde_json::to_value(&header).unwrap();
        assert_eq!(value["PatientUUID"], json!("pt-1"));
        assert!(value.get("OutsideMedicines").is_some());
    }
}
