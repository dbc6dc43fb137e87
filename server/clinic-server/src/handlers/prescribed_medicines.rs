//! Direct access to prescribed medicine lines
//!
//! These endpoints never touch stock. Stock is only deducted through
//! `POST /prescription/save`.

use axum::extract::{Path, State};
use axum::Json;
use datastore_layer::{DatastoreError, Row, RowId, ROW_ID};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::common::{internal_error, listing_item};
use crate::db::prescribed_medicine_repository::PRESCRIBED_MEDICINE_UPDATABLE_COLUMNS;
use crate::error::{api_success, ApiError, ApiResult};
use crate::middleware::JsonBody;
use crate::server::ClinicServer;
use crate::utils::coerce::{present_fields, truthy, value_text};

/// Columns of a line in the per-prescription listing
const LINE_COLUMNS: [&str; 7] = [
    ROW_ID,
    "PrescriptionUUID",
    "MedicineName",
    "frequency",
    "Duration",
    "timing",
    "CREATEDTIME",
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescribedMedicineCreated {
    #[serde(rename = "ROWID")]
    #[schema(value_type = String)]
    pub row_id: Value,
    #[serde(rename = "PrescriptionUUID")]
    #[schema(value_type = String)]
    pub prescription_uuid: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicineList {
    pub prescribed_medicines: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicineLookup {
    pub prescribed_medicine: Option<Row>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrescribedMedicineUpdated {
    #[serde(rename = "ROWID")]
    pub row_id: RowId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicineDeleted {
    pub deleted_row_id: RowId,
}

/// Map a write failure, reporting unknown rows as 404
fn write_error(message: &'static str) -> impl FnOnce(DatastoreError) -> ApiError {
    move |e| {
        if e.is_not_found() {
            ApiError::not_found("Prescribed medicine not found")
        } else {
            internal_error(message)(e)
        }
    }
}

/// Add a medicine line to an existing prescription
#[utoipa::path(
    post,
    path = crate::routes::paths::prescribed_medicines::ADD,
    tag = "prescribed-medicines",
    request_body = Object,
    responses(
        (status = 200, description = "Line created", body = PrescribedMedicineCreated),
        (status = 400, description = "Missing or unknown PrescriptionUUID"),
        (status = 500, description = "Failed to create prescribed medicine")
    )
)]
pub async fn create_prescribed_medicine(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<PrescribedMedicineCreated> {
    let prescription_uuid = body.get("PrescriptionUUID").cloned().unwrap_or(Value::Null);
    if !truthy(Some(&prescription_uuid)) {
        return Err(ApiError::missing_field("PrescriptionUUID"));
    }

    let exists = server
        .prescriptions()
        .exists(&value_text(&prescription_uuid))
        .await
        .map_err(internal_error("Failed to verify prescription"))?;
    if !exists {
        return Err(ApiError::bad_request("Referenced Prescription not found"));
    }

    let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    let row = Row::new()
        .with("PrescriptionUUID", prescription_uuid.clone())
        .with("MedicineName", field("MedicineName"))
        .with("frequency", field("frequency"))
        .with("Duration", field("Duration"))
        .with("timing", field("timing"));

    let inserted = server
        .prescribed_medicines()
        .insert(row)
        .await
        .map_err(internal_error("Failed to create prescribed medicine"))?;

    Ok(Json(api_success(PrescribedMedicineCreated {
        row_id: inserted
            .row_id()
            .map(|id| id.to_value())
            .unwrap_or(Value::Null),
        prescription_uuid,
    })))
}

#[utoipa::path(
    get,
    path = "/prescribedmedicine/all/{prescription_uuid}",
    tag = "prescribed-medicines",
    params(("prescription_uuid" = String, Path, description = "Prescription UUID")),
    responses(
        (status = 200, description = "Lines of the prescription", body = PrescribedMedicineList),
        (status = 500, description = "Failed to fetch prescribed medicines")
    )
)]
pub async fn list_prescribed_medicines(
    State(server): State<ClinicServer>,
    Path(prescription_uuid): Path<String>,
) -> ApiResult<PrescribedMedicineList> {
    let rows = server
        .prescribed_medicines()
        .for_prescription(&prescription_uuid)
        .await
        .map_err(internal_error("Failed to fetch prescribed medicines"))?;

    Ok(Json(api_success(PrescribedMedicineList {
        prescribed_medicines: rows
            .iter()
            .map(|row| listing_item(row, ROW_ID, &LINE_COLUMNS))
            .collect(),
    })))
}

#[utoipa::path(
    get,
    path = "/prescribedmedicine/get/{rowid}",
    tag = "prescribed-medicines",
    params(("rowid" = String, Path, description = "Row identifier")),
    responses(
        (status = 200, description = "Line or null", body = PrescribedMedicineLookup),
        (status = 500, description = "Failed to fetch prescribed medicine")
    )
)]
pub async fn get_prescribed_medicine(
    State(server): State<ClinicServer>,
    Path(row_id): Path<String>,
) -> ApiResult<PrescribedMedicineLookup> {
    let prescribed_medicine = server
        .prescribed_medicines()
        .get(&RowId::from(row_id))
        .await
        .map_err(internal_error("Failed to fetch prescribed medicine"))?;
    Ok(Json(api_success(PrescribedMedicineLookup {
        prescribed_medicine,
    })))
}

/// Overwrite fields of one line; stock is not adjusted
#[utoipa::path(
    put,
    path = "/prescribedmedicine/update/{rowid}",
    tag = "prescribed-medicines",
    params(("rowid" = String, Path, description = "Row identifier")),
    request_body = Object,
    responses(
        (status = 200, description = "Line updated", body = PrescribedMedicineUpdated),
        (status = 400, description = "No updatable fields provided"),
        (status = 404, description = "Prescribed medicine not found"),
        (status = 500, description = "Failed to update prescribed medicine")
    )
)]
pub async fn update_prescribed_medicine(
    State(server): State<ClinicServer>,
    Path(row_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<PrescribedMedicineUpdated> {
    let updates = present_fields(&body, &PRESCRIBED_MEDICINE_UPDATABLE_COLUMNS);
    if updates.is_empty() {
        return Err(ApiError::validation("No updatable fields provided"));
    }

    let row_id = RowId::from(row_id);
    server
        .prescribed_medicines()
        .update(&row_id, Row::from(updates))
        .await
        .map_err(write_error("Failed to update prescribed medicine"))?;

    Ok(Json(api_success(PrescribedMedicineUpdated { row_id })))
}

#[utoipa::path(
    delete,
    path = "/prescribedmedicine/delete/{rowid}",
    tag = "prescribed-medicines",
    params(("rowid" = String, Path, description = "Row identifier")),
    responses(
        (status = 200, description = "Line deleted", body = PrescribedMedicineDeleted),
        (status = 404, description = "Prescribed medicine not found"),
        (status = 500, description = "Failed to delete prescribed medicine")
    )
)]
pub async fn delete_prescribed_medicine(
    State(server): State<ClinicServer>,
    Path(row_id): Path<String>,
) -> ApiResult<PrescribedMedicineDeleted> {
    let row_id = RowId::from(row_id);
    server
        .prescribed_medicines()
        .delete(&row_id)
        .await
        .map_err(write_error("Failed to delete prescribed medicine"))?;

    Ok(Json(api_success(PrescribedMedicineDeleted {
        deleted_row_id: row_id,
    })))
}
