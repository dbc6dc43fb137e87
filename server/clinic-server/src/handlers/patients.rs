//! Patient registry handlers
//!
//! Request payloads are logged only after PII redaction.

use axum::extract::{Query, State};
use axum::Json;
use datastore_layer::Row;
use logger_redacted::{default_redactor, redacted_info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::{
    first_non_empty, internal_error, listing_item, total_or_zero, DeletedRows, UuidQuery,
};
use crate::db::patient_repository::{PATIENT_LIST_COLUMNS, PATIENT_UPDATABLE_COLUMNS};
use crate::error::{api_success, ApiError, ApiResult};
use crate::middleware::JsonBody;
use crate::server::ClinicServer;
use crate::types::{PageMeta, PaginationParams};
use crate::utils::coerce::{
    coerce_or_drop, first_text, present_fields, to_int, truthy, value_text, NumericKind,
};

/// Fields that must be present and non-empty to register a patient
const REQUIRED_FIELDS: [&str; 4] = ["Name", "Phonenumber", "Gender", "Age"];

/// Numeric patient columns and how they are coerced
const NUMERIC_COLUMNS: [(&str, NumericKind); 3] = [
    ("Age", NumericKind::Integer),
    ("Weight", NumericKind::Float),
    ("Height", NumericKind::Float),
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedPatient {
    #[serde(rename = "patientId")]
    #[schema(value_type = String)]
    pub patient_id: Value,
    #[serde(rename = "Name")]
    #[schema(value_type = String)]
    pub name: Value,
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientCreated {
    pub patient: CreatedPatient,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientPage {
    pub patients: Vec<Row>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientLookup {
    pub patient: Option<Row>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientUpdated {
    #[serde(rename = "Phonenumber")]
    pub phonenumber: String,
}

/// `?Phonenumber=` (or `?phone=`) query parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhoneQuery {
    #[serde(rename = "Phonenumber")]
    pub phonenumber: Option<String>,
    pub phone: Option<String>,
}

/// Register a patient
#[utoipa::path(
    post,
    path = crate::routes::paths::patients::ADD,
    tag = "patients",
    request_body = Object,
    responses(
        (status = 200, description = "Patient created", body = PatientCreated),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "Phonenumber already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_patient(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<PatientCreated> {
    let redacted_payload = default_redactor().redact_json(&Value::Object(body.clone()));
    info!(payload = %redacted_payload, "Received add patient request");

    if let Some(field) = REQUIRED_FIELDS.iter().find(|field| !truthy(body.get(**field))) {
        return Err(ApiError::missing_field(field));
    }

    let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    let numeric = |key: &str, kind: NumericKind| kind.coerce(&field(key)).unwrap_or(Value::Null);

    let patients = server.patients();
    let phone = value_text(&field("Phonenumber"));
    match patients.phone_exists(&phone).await {
        Ok(true) => return Err(ApiError::conflict("Phonenumber already exists")),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Failed to check Phonenumber uniqueness"),
    }

    let uuid = Uuid::new_v4().to_string();
    let mut row = Row::new()
        .with("Name", field("Name"))
        .with("Gender", field("Gender"))
        .with("Age", numeric("Age", NumericKind::Integer))
        .with("Profession", field("Profession"))
        .with("Weight", numeric("Weight", NumericKind::Float))
        .with("Height", numeric("Height", NumericKind::Float))
        .with("Phonenumber", field("Phonenumber"))
        .with("MedicialHistory", field("MedicialHistory"))
        .with("UUID", Value::from(uuid.as_str()))
        .with("Address", field("Address"));
    if let Some(Ok(Some(adhar))) = body.get("AdharNumber").map(to_int) {
        row.set("AdharNumber", Value::from(adhar));
    }

    let inserted = patients
        .insert(row)
        .await
        .map_err(internal_error("Failed to create patient"))?;

    let patient = CreatedPatient {
        patient_id: inserted
            .row_id()
            .map(|id| id.to_value())
            .unwrap_or_else(|| field("Phonenumber")),
        name: field("Name"),
        uuid,
    };
    redacted_info!("Patient created: {} ({})", patient.uuid, phone);

    Ok(Json(api_success(PatientCreated { patient })))
}

/// One page of patients
#[utoipa::path(
    get,
    path = crate::routes::paths::patients::ALL,
    tag = "patients",
    params(PaginationParams),
    responses(
        (status = 200, description = "Patients retrieved", body = PatientPage),
        (status = 500, description = "Failed to fetch patients")
    )
)]
pub async fn list_patients(
    State(server): State<ClinicServer>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PatientPage> {
    let config = &server.config.pagination;
    let patients = server.patients();

    let total = total_or_zero(patients.count().await, "Patient");
    let rows = patients
        .page(params.page(), params.per_page(config))
        .await
        .map_err(internal_error("Failed to fetch patients"))?;

    Ok(Json(api_success(PatientPage {
        patients: rows
            .iter()
            .map(|row| listing_item(row, "id", &PATIENT_LIST_COLUMNS))
            .collect(),
        meta: params.page_meta(config, total),
    })))
}

/// Look a patient up by phone number
#[utoipa::path(
    get,
    path = crate::routes::paths::patients::PATIENT,
    tag = "patients",
    params(PhoneQuery),
    responses(
        (status = 200, description = "Patient or null", body = PatientLookup),
        (status = 400, description = "Missing phone query parameter"),
        (status = 500, description = "Failed to fetch patient")
    )
)]
pub async fn get_patient_by_phone(
    State(server): State<ClinicServer>,
    Query(query): Query<PhoneQuery>,
) -> ApiResult<PatientLookup> {
    let phone = first_non_empty(&query.phonenumber, &query.phone)
        .ok_or_else(|| ApiError::bad_request("Missing phone query parameter"))?;

    let patient = server
        .patients()
        .find_by_phone(phone)
        .await
        .map_err(internal_error("Failed to fetch patient"))?;

    Ok(Json(api_success(PatientLookup { patient })))
}

/// Update a patient identified by phone number
#[utoipa::path(
    put,
    path = crate::routes::paths::patients::PATIENT,
    tag = "patients",
    request_body = Object,
    responses(
        (status = 200, description = "Patient updated", body = PatientUpdated),
        (status = 400, description = "Missing Phonenumber or no updatable fields"),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Failed to update patient")
    )
)]
pub async fn update_patient(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<PatientUpdated> {
    let phone = first_text(&body, &["Phonenumber", "phone"])
        .ok_or_else(|| ApiError::missing_field("Phonenumber"))?;

    let mut updates = present_fields(&body, &PATIENT_UPDATABLE_COLUMNS);
    coerce_or_drop(&mut updates, &NUMERIC_COLUMNS);
    if updates.is_empty() {
        return Err(ApiError::validation("No updatable fields provided"));
    }

    let patients = server.patients();
    let row_id = patients
        .row_id_by_phone(&phone)
        .await
        .map_err(internal_error("Failed to update patient"))?
        .ok_or_else(|| ApiError::not_found("Patient not found"))?;

    patients
        .update(&row_id, Row::from(updates))
        .await
        .map_err(internal_error("Failed to update patient"))?;

    Ok(Json(api_success(PatientUpdated { phonenumber: phone })))
}

/// Delete every patient row carrying a UUID
#[utoipa::path(
    delete,
    path = crate::routes::paths::patients::PATIENT,
    tag = "patients",
    params(UuidQuery),
    responses(
        (status = 200, description = "Rows deleted", body = DeletedRows),
        (status = 400, description = "Missing UUID query parameter"),
        (status = 404, description = "No patient found with that UUID"),
        (status = 500, description = "Failed to delete patient(s)")
    )
)]
pub async fn delete_patient(
    State(server): State<ClinicServer>,
    Query(query): Query<UuidQuery>,
) -> ApiResult<DeletedRows> {
    let uuid = query
        .uuid()
        .ok_or_else(|| ApiError::bad_request("Please provide UUID query param to delete patient."))?;

    let patients = server.patients();
    let row_ids = patients
        .row_ids_by_uuid(uuid)
        .await
        .map_err(internal_error("Failed to delete patient(s)"))?;
    if row_ids.is_empty() {
        return Err(ApiError::not_found("No patient found with that UUID"));
    }

    let deleted_row_ids = patients.delete_each(&row_ids).await;
    Ok(Json(api_success(DeletedRows { deleted_row_ids })))
}
