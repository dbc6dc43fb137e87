//! Atomic prescription save
//!
//! Saves a prescription header together with its medicine lines and deducts
//! the prescribed quantities from stock. The datastore offers single-row
//! writes only, so atomicity is approximated:
//!
//! 1. every stock-affecting line is checked before anything is written
//! 2. each mutation records an undo step in a [`CompensationLog`]
//! 3. any failed mutation unwinds the log newest first
//!
//! Saves touching the same medicine are serialized through [`StockLocks`].
//!
//! Rollback is deliberately partial in update mode: the overwritten header,
//! lines deleted through `deletedMedicineRowIds` and lines inserted during the
//! save are left as they are. Only stock quantities are restored.

use std::sync::Arc;

use datastore_layer::{Datastore, DatastoreError, Row, RowId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::audit::{SaveAudit, SaveEvent, SaveMode};
use super::compensation::{Compensation, CompensationLog};
use super::dosage::required_quantity;
use super::stock_locks::StockLocks;
use crate::db::{
    MedicineStockRepository, PatientRepository, PrescribedMedicineRepository, PrescriptionHeader,
    PrescriptionRepository, StockLevel, PRESCRIBED_MEDICINE_TABLE, PRESCRIPTION_TABLE,
};
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::utils::coerce::{truthy, value_text};

/// Reasons a save is refused or fails
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidPayload(String),

    #[error("Referenced Patient not found")]
    PatientNotFound,

    #[error("Failed to verify patient")]
    PatientLookup(#[source] DatastoreError),

    #[error("Medicine not found in stock: {0}")]
    MedicineNotFound(String),

    #[error("Insufficient stock for: {name} (required {required}, available {available})")]
    InsufficientStock {
        name: String,
        required: i64,
        available: i64,
    },

    #[error("Failed to verify stock for: {name}")]
    StockLookup {
        name: String,
        #[source]
        source: DatastoreError,
    },

    #[error("Prescription not found for UUID")]
    PrescriptionNotFound,

    #[error("Failed to save prescription")]
    Mutation { details: String },
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::MissingField(field) => ApiError::missing_field(field),
            SaveError::InvalidPayload(message) => ApiError::validation(message),
            SaveError::PatientNotFound => ApiError::bad_request(err.to_string()),
            SaveError::PatientLookup(ref source) => {
                ApiError::internal_with_details(err.to_string(), source)
            }
            SaveError::MedicineNotFound(_) | SaveError::InsufficientStock { .. } => {
                ApiError::conflict(err.to_string())
            }
            SaveError::StockLookup { ref source, .. } => {
                ApiError::internal_with_details(err.to_string(), source)
            }
            SaveError::PrescriptionNotFound => ApiError::not_found(err.to_string()),
            SaveError::Mutation { ref details } => {
                ApiError::internal_with_details(err.to_string(), details)
            }
        }
    }
}

/// Failure of a single mutation step; always triggers rollback
#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    #[error("Medicine not found in stock: {0}")]
    StockVanished(String),

    #[error("Stock became negative for {0}")]
    NegativeStock(String),
}

/// One submitted medicine line, values kept as sent
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineLine {
    pub row_id: Option<RowId>,
    pub medicine_name: Value,
    pub frequency: Value,
    pub duration: Value,
    pub timing: Value,
}

impl MedicineLine {
    fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).cloned().unwrap_or(Value::Null);
        let row_id = map
            .get("ROWID")
            .filter(|value| truthy(Some(*value)))
            .and_then(RowId::from_value);
        Self {
            row_id,
            medicine_name: field("MedicineName"),
            frequency: field("frequency"),
            duration: field("Duration"),
            timing: field("timing"),
        }
    }

    /// Medicine name used for the stock lookup, if the line names one
    pub fn stock_name(&self) -> Option<String> {
        truthy(Some(&self.medicine_name)).then(|| value_text(&self.medicine_name))
    }

    /// Units this line consumes
    pub fn required(&self) -> i64 {
        required_quantity(&self.duration, self.frequency.as_str())
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("MedicineName", self.medicine_name.clone())
            .with("frequency", self.frequency.clone())
            .with("Duration", self.duration.clone())
            .with("timing", self.timing.clone())
    }

    fn saved(&self, row_id: Option<&RowId>) -> SavedMedicineLine {
        SavedMedicineLine {
            row_id: row_id.map(RowId::to_value).unwrap_or(Value::Null),
            medicine_name: self.medicine_name.clone(),
            frequency: self.frequency.clone(),
            duration: self.duration.clone(),
            timing: self.timing.clone(),
        }
    }
}

/// Parsed `POST /prescription/save` body
#[derive(Debug, Clone)]
pub struct SavePrescriptionRequest {
    /// Existing prescription to rewrite; `None` creates a new one
    pub uuid: Option<String>,
    pub patient_uuid: String,
    pub header: PrescriptionHeader,
    pub medicines: Vec<MedicineLine>,
    pub deleted_row_ids: Vec<RowId>,
}

impl SavePrescriptionRequest {
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, SaveError> {
        if !truthy(map.get("PatientUUID")) {
            return Err(SaveError::MissingField("PatientUUID"));
        }
        let header = PrescriptionHeader::from_map(map);
        let patient_uuid = value_text(&header.patient_uuid);

        let medicines = match map.get("medicines") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(line) => Ok(MedicineLine::from_map(line)),
                    _ => Err(SaveError::InvalidPayload(format!(
                        "Invalid medicine entry at index {}",
                        index
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(SaveError::InvalidPayload(
                    "medicines must be an array".to_string(),
                ))
            }
        };

        let deleted_row_ids = match map.get("deletedMedicineRowIds") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(ids)) => ids.iter().filter_map(RowId::from_value).collect(),
            Some(_) => {
                return Err(SaveError::InvalidPayload(
                    "deletedMedicineRowIds must be an array".to_string(),
                ))
            }
        };

        let uuid = match map.get("UUID") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(other) => Some(value_text(other)),
        };

        Ok(Self {
            uuid,
            patient_uuid,
            header,
            medicines,
            deleted_row_ids,
        })
    }

    pub fn mode(&self) -> SaveMode {
        if self.uuid.is_some() {
            SaveMode::Update
        } else {
            SaveMode::Create
        }
    }
}

/// Total units needed from one stock row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequirement {
    pub name: String,
    pub required: i64,
}

/// Sum the requirement of every stock-affecting line per medicine name,
/// in order of first appearance
pub fn aggregate_requirements(lines: &[MedicineLine]) -> Vec<StockRequirement> {
    let mut requirements: Vec<StockRequirement> = Vec::new();
    for line in lines {
        let Some(name) = line.stock_name() else {
            continue;
        };
        let required = line.required();
        if required <= 0 {
            continue;
        }
        match requirements.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.required = existing.required.saturating_add(required),
            None => requirements.push(StockRequirement { name, required }),
        }
    }
    requirements
}

/// A reconciled medicine line as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedMedicineLine {
    #[serde(rename = "ROWID")]
    #[schema(value_type = Object)]
    pub row_id: Value,
    #[serde(rename = "MedicineName")]
    #[schema(value_type = Object)]
    pub medicine_name: Value,
    #[schema(value_type = Object)]
    pub frequency: Value,
    #[serde(rename = "Duration")]
    #[schema(value_type = Object)]
    pub duration: Value,
    #[schema(value_type = Object)]
    pub timing: Value,
}

/// Quantity left on hand after the save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdatedStock {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedPrescription {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(flatten)]
    pub header: PrescriptionHeader,
    pub medicines: Vec<SavedMedicineLine>,
    #[serde(rename = "updatedMedicineStock")]
    pub updated_medicine_stock: Vec<UpdatedStock>,
}

/// Orchestrates the validate, mutate and compensate sequence of a save
#[derive(Clone)]
pub struct PrescriptionSaveService {
    store: Arc<dyn Datastore>,
    patients: PatientRepository,
    prescriptions: PrescriptionRepository,
    lines: PrescribedMedicineRepository,
    stock: MedicineStockRepository,
    locks: Arc<StockLocks>,
    audit: Arc<dyn SaveAudit>,
}

impl PrescriptionSaveService {
    pub fn new(store: Arc<dyn Datastore>, locks: Arc<StockLocks>, audit: Arc<dyn SaveAudit>) -> Self {
        Self {
            patients: PatientRepository::new(store.clone()),
            prescriptions: PrescriptionRepository::new(store.clone()),
            lines: PrescribedMedicineRepository::new(store.clone()),
            stock: MedicineStockRepository::new(store.clone()),
            store,
            locks,
            audit,
        }
    }

    pub async fn save(
        &self,
        ctx: &RequestContext,
        request: SavePrescriptionRequest,
    ) -> Result<SavedPrescription, SaveError> {
        let mode = request.mode();
        self.audit.record(
            ctx,
            SaveEvent::Started {
                mode,
                patient_uuid: request.patient_uuid.clone(),
                lines: request.medicines.len(),
            },
        );

        match self.patients.exists(&request.patient_uuid).await {
            Ok(true) => {}
            Ok(false) => return Err(SaveError::PatientNotFound),
            Err(e) => return Err(SaveError::PatientLookup(e)),
        }

        let requirements = aggregate_requirements(&request.medicines);
        let _guard = self
            .locks
            .lock_all(requirements.iter().map(|r| r.name.as_str()))
            .await;

        self.validate_stock(&requirements).await?;
        self.audit.record(
            ctx,
            SaveEvent::StockValidated {
                medicines: requirements.len(),
            },
        );

        let existing = match &request.uuid {
            Some(uuid) => match self.prescriptions.row_id_by_uuid(uuid).await {
                Ok(Some(row_id)) => Some(row_id),
                Ok(None) => return Err(SaveError::PrescriptionNotFound),
                Err(e) => {
                    return Err(SaveError::Mutation {
                        details: e.to_string(),
                    })
                }
            },
            None => None,
        };

        let mut log = CompensationLog::new();
        match self
            .apply(ctx, &request, existing, &requirements, &mut log)
            .await
        {
            Ok(saved) => {
                self.audit.record(
                    ctx,
                    SaveEvent::Completed {
                        prescription_uuid: saved.uuid.clone(),
                    },
                );
                Ok(saved)
            }
            Err(e) => {
                let details = e.to_string();
                self.audit.record(
                    ctx,
                    SaveEvent::Failed {
                        error: details.clone(),
                    },
                );
                log.unwind(self.store.as_ref(), self.audit.as_ref(), ctx)
                    .await;
                Err(SaveError::Mutation { details })
            }
        }
    }

    /// Check every requirement against stock before anything is written
    async fn validate_stock(&self, requirements: &[StockRequirement]) -> Result<(), SaveError> {
        for requirement in requirements {
            let level = self
                .stock
                .stock_level(&requirement.name)
                .await
                .map_err(|source| SaveError::StockLookup {
                    name: requirement.name.clone(),
                    source,
                })?
                .ok_or_else(|| SaveError::MedicineNotFound(requirement.name.clone()))?;

            if level.quantity < requirement.required {
                return Err(SaveError::InsufficientStock {
                    name: requirement.name.clone(),
                    required: requirement.required,
                    available: level.quantity,
                });
            }
        }
        Ok(())
    }

    async fn apply(
        &self,
        ctx: &RequestContext,
        request: &SavePrescriptionRequest,
        existing: Option<RowId>,
        requirements: &[StockRequirement],
        log: &mut CompensationLog,
    ) -> Result<SavedPrescription, StepError> {
        let mode = request.mode();

        let (uuid, header_row_id) = match (existing, &request.uuid) {
            (Some(row_id), Some(uuid)) => {
                self.prescriptions
                    .update(&row_id, request.header.to_row())
                    .await?;
                (uuid.clone(), row_id)
            }
            _ => {
                let uuid = Uuid::new_v4().to_string();
                let row = self.prescriptions.insert(&uuid, &request.header).await?;
                let row_id = match row.row_id() {
                    Some(row_id) => row_id,
                    None => self
                        .prescriptions
                        .row_id_by_uuid(&uuid)
                        .await?
                        .ok_or_else(|| {
                            DatastoreError::UnexpectedResponse(format!(
                                "inserted prescription {} has no ROWID",
                                uuid
                            ))
                        })?,
                };
                log.record(Compensation::DeleteRow {
                    table: PRESCRIPTION_TABLE,
                    row_id: row_id.clone(),
                });
                (uuid, row_id)
            }
        };
        self.audit.record(
            ctx,
            SaveEvent::HeaderWritten {
                prescription_uuid: uuid.clone(),
                row_id: header_row_id,
            },
        );

        if mode == SaveMode::Update {
            for row_id in &request.deleted_row_ids {
                if let Err(e) = self.lines.delete(row_id).await {
                    self.audit.record(
                        ctx,
                        SaveEvent::LineDeleteFailed {
                            row_id: row_id.clone(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        let mut updated_medicine_stock = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let level = self.deduct(requirement).await?;
            let remaining = level.quantity - requirement.required;
            log.record(Compensation::RestoreStock {
                row_id: level.row_id,
                medicine: requirement.name.clone(),
                quantity: level.quantity,
            });
            self.audit.record(
                ctx,
                SaveEvent::StockDeducted {
                    medicine: requirement.name.clone(),
                    previous: level.quantity,
                    remaining,
                },
            );
            updated_medicine_stock.push(UpdatedStock {
                name: requirement.name.clone(),
                quantity: remaining,
            });
        }

        let mut medicines = Vec::with_capacity(request.medicines.len());
        let (mut updated, mut inserted) = (0, 0);
        for line in &request.medicines {
            match &line.row_id {
                Some(row_id) => {
                    self.lines.update(row_id, line.to_row()).await?;
                    updated += 1;
                    medicines.push(line.saved(Some(row_id)));
                }
                None => {
                    let row = self
                        .lines
                        .insert(line.to_row().with("PrescriptionUUID", Value::from(uuid.as_str())))
                        .await?;
                    let row_id = row.row_id();
                    if mode == SaveMode::Create {
                        if let Some(row_id) = &row_id {
                            log.record(Compensation::DeleteRow {
                                table: PRESCRIBED_MEDICINE_TABLE,
                                row_id: row_id.clone(),
                            });
                        }
                    }
                    inserted += 1;
                    medicines.push(line.saved(row_id.as_ref()));
                }
            }
        }
        self.audit
            .record(ctx, SaveEvent::LinesReconciled { updated, inserted });

        Ok(SavedPrescription {
            uuid,
            header: request.header.clone(),
            medicines,
            updated_medicine_stock,
        })
    }

    /// Re-read the stock row and write the decremented quantity; returns the
    /// level as it was before the write
    async fn deduct(&self, requirement: &StockRequirement) -> Result<StockLevel, StepError> {
        let level = self
            .stock
            .stock_level(&requirement.name)
            .await?
            .ok_or_else(|| StepError::StockVanished(requirement.name.clone()))?;
        let remaining = level.quantity - requirement.required;
        if remaining < 0 {
            return Err(StepError::NegativeStock(requirement.name.clone()));
        }
        self.stock.set_quantity(&level.row_id, remaining).await?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> Result<SavePrescriptionRequest, SaveError> {
        SavePrescriptionRequest::from_map(body.as_object().unwrap())
    }

    #[test]
    fn patient_uuid_is_required() {
        let err = request(json!({"medicines": []})).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: PatientUUID");
        let err = request(json!({"PatientUUID": ""})).unwrap_err();
        assert!(matches!(err, SaveError::MissingField("PatientUUID")));
    }

    #[test]
    fn medicines_default_to_empty_only_when_absent() {
        let parsed = request(json!({"PatientUUID": "pt-1"})).unwrap();
        assert!(parsed.medicines.is_empty());
        assert_eq!(parsed.mode(), SaveMode::Create);

        let err = request(json!({"PatientUUID": "pt-1", "medicines": null})).unwrap_err();
        assert_eq!(err.to_string(), "medicines must be an array");

        let err = request(json!({"PatientUUID": "pt-1", "medicines": {"MedicineName": "A"}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "medicines must be an array");
    }

    #[test]
    fn non_object_lines_are_rejected() {
        let err = request(json!({"PatientUUID": "pt-1", "medicines": [{"MedicineName": "A"}, "B"]}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid medicine entry at index 1");
    }

    #[test]
    fn update_mode_needs_non_empty_uuid() {
        let parsed = request(json!({"PatientUUID": "pt-1", "UUID": ""})).unwrap();
        assert_eq!(parsed.mode(), SaveMode::Create);
        let parsed = request(json!({"PatientUUID": "pt-1", "UUID": "rx-9"})).unwrap();
        assert_eq!(parsed.mode(), SaveMode::Update);
        assert_eq!(parsed.uuid.as_deref(), Some("rx-9"));
    }

    #[test]
    fn deleted_row_ids_accept_numbers_and_strings() {
        let parsed = request(json!({
            "PatientUUID": "pt-1",
            "deletedMedicineRowIds": [12, "13", "", null]
        }))
        .unwrap();
        assert_eq!(parsed.deleted_row_ids, vec![RowId::from(12_u64), RowId::from("13")]);

        let err = request(json!({"PatientUUID": "pt-1", "deletedMedicineRowIds": "12"})).unwrap_err();
        assert!(matches!(err, SaveError::InvalidPayload(_)));
    }

    #[test]
    fn line_row_ids_are_read_leniently() {
        let parsed = request(json!({
            "PatientUUID": "pt-1",
            "medicines": [
                {"ROWID": 7, "MedicineName": "A"},
                {"ROWID": "", "MedicineName": "B"},
                {"MedicineName": "C"}
            ]
        }))
        .unwrap();
        let ids: Vec<Option<RowId>> = parsed.medicines.iter().map(|l| l.row_id.clone()).collect();
        assert_eq!(ids, vec![Some(RowId::from(7_u64)), None, None]);
    }

    #[test]
    fn requirements_are_aggregated_by_name() {
        let parsed = request(json!({
            "PatientUUID": "pt-1",
            "medicines": [
                {"MedicineName": "Amoxicillin", "frequency": "Twice daily", "Duration": 3},
                {"MedicineName": "", "frequency": "Twice daily", "Duration": 3},
                {"MedicineName": "Zinc", "frequency": "Once daily", "Duration": 0},
                {"MedicineName": "Cetirizine", "frequency": "Once daily", "Duration": "2"},
                {"MedicineName": "Amoxicillin", "frequency": "Once daily", "Duration": 4}
            ]
        }))
        .unwrap();
        let requirements = aggregate_requirements(&parsed.medicines);
        assert_eq!(
            requirements,
            vec![
                StockRequirement {
                    name: "Amoxicillin".to_string(),
                    required: 10
                },
                StockRequirement {
                    name: "Cetirizine".to_string(),
                    required: 2
                },
            ]
        );
    }

    #[test]
    fn save_errors_map_to_status_codes() {
        use axum::http::StatusCode;

        let cases = [
            (SaveError::MissingField("PatientUUID"), StatusCode::BAD_REQUEST),
            (SaveError::PatientNotFound, StatusCode::BAD_REQUEST),
            (SaveError::MedicineNotFound("A".to_string()), StatusCode::CONFLICT),
            (
                SaveError::InsufficientStock {
                    name: "B".to_string(),
                    required: 6,
                    available: 5,
                },
                StatusCode::CONFLICT,
            ),
            (SaveError::PrescriptionNotFound, StatusCode::NOT_FOUND),
            (
                SaveError::Mutation {
                    details: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn saved_prescription_flattens_header() {
        let saved = SavedPrescription {
            uuid: "rx-1".to_string(),
            header: PrescriptionHeader {
                patient_uuid: json!("pt-1"),
                fees: json!(250),
                ..Default::default()
            },
            medicines: Vec::new(),
            updated_medicine_stock: vec![UpdatedStock {
                name: "Zinc".to_string(),
                quantity: 3,
            }],
        };
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["UUID"], json!("rx-1"));
        assert_eq!(value["PatientUUID"], json!("pt-1"));
        assert_eq!(value["fees"], json!(250));
        assert_eq!(value["updatedMedicineStock"][0], json!({"Name": "Zinc", "Quantity": 3}));
    }
}
