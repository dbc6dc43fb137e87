use axum::extract::{Path, Query, State};
use axum::Json;
use datastore_layer::{Row, ROW_ID};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{internal_error, listing_item, total_or_zero, DeletedRows};
use crate::db::prescription_repository::{
    PRESCRIPTION_LIST_COLUMNS, PRESCRIPTION_UPDATABLE_COLUMNS,
};
use crate::db::PrescriptionHeader;
use crate::error::{api_success, ApiError, ApiResult};
use crate::middleware::{JsonBody, RequestContext};
use crate::server::ClinicServer;
use crate::services::{SavePrescriptionRequest, SavedPrescription};
use crate::types::{PageMeta, PaginationParams};
use crate::utils::coerce::{present_fields, truthy, value_text};

/// Columns of a line in the patient history view
const HISTORY_LINE_COLUMNS: [&str; 5] = [ROW_ID, "MedicineName", "frequency", "Duration", "timing"];

/// Columns of a prescription in the patient history view
const HISTORY_COLUMNS: [&str; 6] = [
    "UUID",
    "PatientUUID",
    "CurrentSymptoms",
    "OutsideMedicines",
    "fees",
    "CREATEDTIME",
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionRef {
    #[serde(rename = "UUID")]
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionPage {
    pub prescriptions: Vec<Row>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionLookup {
    pub prescription: Option<Row>,
}

/// Resolve a referenced patient UUID, mapping absence to a 400
async fn require_patient(server: &ClinicServer, patient_uuid: &Value) -> Result<(), ApiError> {
    let exists = server
        .patients()
        .exists(&value_text(patient_uuid))
        .await
        .map_err(internal_error("Failed to verify patient"))?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::bad_request("Referenced Patient not found"))
    }
}

/// Create a prescription header without medicine lines
#[utoipa::path(
    post,
    path = crate::routes::paths::prescriptions::ADD,
    tag = "prescriptions",
    request_body = Object,
    responses(
        (status = 200, description = "Prescription created", body = PrescriptionRef),
        (status = 400, description = "Missing or unknown PatientUUID"),
        (status = 500, description = "Failed to create prescription")
    )
)]
pub async fn create_prescription(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<PrescriptionRef> {
    if !truthy(body.get("PatientUUID")) {
        return Err(ApiError::missing_field("PatientUUID"));
    }
    let header = PrescriptionHeader::from_map(&body);
    require_patient(&server, &header.patient_uuid).await?;

    let uuid = Uuid::new_v4().to_string();
    server
        .prescriptions()
        .insert(&uuid, &header)
        .await
        .map_err(internal_error("Failed to create prescription"))?;

    info!(prescription_uuid = %uuid, "Prescription created");
    Ok(Json(api_success(PrescriptionRef { uuid })))
}

/// Save a prescription with its medicine lines and deduct stock atomically
#[utoipa::path(
    post,
    path = crate::routes::paths::prescriptions::SAVE,
    tag = "prescriptions",
    request_body = Object,
    responses(
        (status = 200, description = "Prescription saved and stock deducted", body = SavedPrescription),
        (status = 400, description = "Invalid payload or unknown patient"),
        (status = 404, description = "Prescription not found for UUID"),
        (status = 409, description = "Medicine missing from stock or insufficient stock"),
        (status = 500, description = "Save failed and was rolled back")
    )
)]
pub async fn save_prescription(
    State(server): State<ClinicServer>,
    ctx: RequestContext,
    JsonBody(body): JsonBody,
) -> ApiResult<SavedPrescription> {
    let request = SavePrescriptionRequest::from_map(&body)?;
    let saved = server.prescription_saver().save(&ctx, request).await?;
    Ok(Json(api_success(saved)))
}

/// One page of prescriptions
#[utoipa::path(
    get,
    path = crate::routes::paths::prescriptions::ALL,
    tag = "prescriptions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Prescriptions retrieved", body = PrescriptionPage),
        (status = 500, description = "Failed to fetch prescriptions")
    )
)]
pub async fn list_prescriptions(
    State(server): State<ClinicServer>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PrescriptionPage> {
    let config = &server.config.pagination;
    let prescriptions = server.prescriptions();

    let total = total_or_zero(prescriptions.count().await, "Prescription");
    let rows = prescriptions
        .page(params.page(), params.per_page(config))
        .await
        .map_err(internal_error("Failed to fetch prescriptions"))?;

    Ok(Json(api_success(PrescriptionPage {
        prescriptions: rows
            .iter()
            .map(|row| listing_item(row, ROW_ID, &PRESCRIPTION_LIST_COLUMNS))
            .collect(),
        meta: params.page_meta(config, total),
    })))
}

#[utoipa::path(
    get,
    path = "/prescription/get/{uuid}",
    tag = "prescriptions",
    params(("uuid" = String, Path, description = "Prescription UUID")),
    responses(
        (status = 200, description = "Prescription or null", body = PrescriptionLookup),
        (status = 500, description = "Failed to fetch prescription")
    )
)]
pub async fn get_prescription(
    State(server): State<ClinicServer>,
    Path(uuid): Path<String>,
) -> ApiResult<PrescriptionLookup> {
    let prescription = server
        .prescriptions()
        .find_by_uuid(&uuid)
        .await
        .map_err(internal_error("Failed to fetch prescription"))?;
    Ok(Json(api_success(PrescriptionLookup { prescription })))
}

/// Update header fields of a prescription
#[utoipa::path(
    put,
    path = "/prescription/update/{uuid}",
    tag = "prescriptions",
    params(("uuid" = String, Path, description = "Prescription UUID")),
    request_body = Object,
    responses(
        (status = 200, description = "Prescription updated", body = PrescriptionRef),
        (status = 400, description = "No updatable fields or unknown PatientUUID"),
        (status = 404, description = "Prescription not found for UUID"),
        (status = 500, description = "Failed to update prescription")
    )
)]
pub async fn update_prescription(
    State(server): State<ClinicServer>,
    Path(uuid): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<PrescriptionRef> {
    let updates = present_fields(&body, &PRESCRIPTION_UPDATABLE_COLUMNS);
    if updates.is_empty() {
        return Err(ApiError::validation("No updatable fields provided"));
    }
    if let Some(patient_uuid) = updates.get("PatientUUID") {
        if !truthy(Some(patient_uuid)) {
            return Err(ApiError::missing_field("PatientUUID"));
        }
        require_patient(&server, patient_uuid).await?;
    }

    let prescriptions = server.prescriptions();
    let row_id = prescriptions
        .row_id_by_uuid(&uuid)
        .await
        .map_err(internal_error("Failed to update prescription"))?
        .ok_or_else(|| ApiError::not_found("Prescription not found for UUID"))?;

    prescriptions
        .update(&row_id, Row::from(updates))
        .await
        .map_err(internal_error("Failed to update prescription"))?;

    Ok(Json(api_success(PrescriptionRef { uuid })))
}

/// Delete a prescription and every medicine line linked to it
#[utoipa::path(
    delete,
    path = "/prescription/delete/{uuid}",
    tag = "prescriptions",
    params(("uuid" = String, Path, description = "Prescription UUID")),
    responses(
        (status = 200, description = "Prescription rows deleted", body = DeletedRows),
        (status = 404, description = "No prescription found with that UUID"),
        (status = 500, description = "Failed to delete prescription")
    )
)]
pub async fn delete_prescription(
    State(server): State<ClinicServer>,
    Path(uuid): Path<String>,
) -> ApiResult<DeletedRows> {
    let prescriptions = server.prescriptions();
    let row_ids = prescriptions
        .row_ids_by_uuid(&uuid)
        .await
        .map_err(internal_error("Failed to delete prescription"))?;
    if row_ids.is_empty() {
        return Err(ApiError::not_found("No prescription found with that UUID"));
    }

    let lines = server.prescribed_medicines();
    match lines.row_ids_for_prescription(&uuid).await {
        Ok(line_ids) => {
            let deleted = lines.delete_each(&line_ids).await;
            info!(
                prescription_uuid = %uuid,
                deleted = deleted.len(),
                "Deleted prescribed medicines"
            );
        }
        Err(e) => warn!(
            prescription_uuid = %uuid,
            error = %e,
            "Failed to cascade delete prescribed medicines"
        ),
    }

    let deleted_row_ids = prescriptions.delete_each(&row_ids).await;
    Ok(Json(api_success(DeletedRows { deleted_row_ids })))
}

/// Prescription history of a patient, newest first, each with its lines
#[utoipa::path(
    get,
    path = "/prescription/patient/{patient_uuid}",
    tag = "prescriptions",
    params(("patient_uuid" = String, Path, description = "Patient UUID")),
    responses(
        (status = 200, description = "Prescriptions with medicines", body = Vec<Row>),
        (status = 500, description = "Failed to fetch patient prescriptions")
    )
)]
pub async fn patient_history(
    State(server): State<ClinicServer>,
    Path(patient_uuid): Path<String>,
) -> ApiResult<Vec<Row>> {
    let failed = "Failed to fetch patient prescriptions";
    let headers = server
        .prescriptions()
        .for_patient(&patient_uuid)
        .await
        .map_err(internal_error(failed))?;

    let lines = server.prescribed_medicines();
    let mut history = Vec::with_capacity(headers.len());
    for header in &headers {
        let medicines: Vec<Value> = match header.get("UUID").filter(|uuid| truthy(Some(*uuid))) {
            Some(uuid) => lines
                .for_prescription(&value_text(uuid))
                .await
                .map_err(internal_error(failed))?
                .iter()
                .map(|line| listing_item(line, ROW_ID, &HISTORY_LINE_COLUMNS).into_value())
                .collect(),
            None => Vec::new(),
        };
        let item = HISTORY_COLUMNS
            .iter()
            .fold(Row::new(), |item, column| {
                item.with(*column, header.get(column).cloned().unwrap_or(Value::Null))
            })
            .with("medicines", Value::Array(medicines));
        history.push(item);
    }

    Ok(Json(api_success(history)))
}
