use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::routes::paths;
use crate::server::ClinicServer;

/// OpenAPI document for the clinic API
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        crate::handlers::health::health_check,

        // Patients
        crate::handlers::patients::create_patient,
        crate::handlers::patients::list_patients,
        crate::handlers::patients::get_patient_by_phone,
        crate::handlers::patients::update_patient,
        crate::handlers::patients::delete_patient,

        // Prescriptions
        crate::handlers::prescriptions::create_prescription,
        crate::handlers::prescriptions::save_prescription,
        crate::handlers::prescriptions::list_prescriptions,
        crate::handlers::prescriptions::get_prescription,
        crate::handlers::prescriptions::update_prescription,
        crate::handlers::prescriptions::delete_prescription,
        crate::handlers::prescriptions::patient_history,

        // Prescribed medicines
        crate::handlers::prescribed_medicines::create_prescribed_medicine,
        crate::handlers::prescribed_medicines::list_prescribed_medicines,
        crate::handlers::prescribed_medicines::get_prescribed_medicine,
        crate::handlers::prescribed_medicines::update_prescribed_medicine,
        crate::handlers::prescribed_medicines::delete_prescribed_medicine,

        // Medicine stock
        crate::handlers::medicine_stock::create_medicine,
        crate::handlers::medicine_stock::list_medicines,
        crate::handlers::medicine_stock::get_medicine_by_name,
        crate::handlers::medicine_stock::update_medicine,
        crate::handlers::medicine_stock::delete_medicine,
    ),
    components(
        schemas(
            crate::error::ApiErrorResponse,
            crate::types::PageMeta,
            crate::handlers::common::DeletedRows,
            crate::handlers::health::HealthResponse,
            crate::handlers::patients::PatientCreated,
            crate::handlers::patients::PatientPage,
            crate::handlers::patients::PatientLookup,
            crate::handlers::patients::PatientUpdated,
            crate::handlers::prescriptions::PrescriptionRef,
            crate::handlers::prescriptions::PrescriptionPage,
            crate::handlers::prescriptions::PrescriptionLookup,
            crate::services::prescription_save::SavedPrescription,
            crate::services::prescription_save::SavedMedicineLine,
            crate::services::prescription_save::UpdatedStock,
            crate::handlers::prescribed_medicines::PrescribedMedicineCreated,
            crate::handlers::prescribed_medicines::PrescribedMedicineList,
            crate::handlers::prescribed_medicines::PrescribedMedicineLookup,
            crate::handlers::medicine_stock::MedicineCreated,
            crate::handlers::medicine_stock::MedicinePage,
            crate::handlers::medicine_stock::MedicineLookup,
            crate::handlers::medicine_stock::MedicineUpdated,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "patients", description = "Patient registry"),
        (name = "prescriptions", description = "Prescriptions and the atomic save"),
        (name = "prescribed-medicines", description = "Medicine lines of a prescription"),
        (name = "medicine-stock", description = "Medicine inventory"),
    ),
    info(
        title = "Clinic API",
        description = "Patients, prescriptions, prescribed medicines and the medicine stock ledger.",
    ),
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create OpenAPI documentation routes
pub fn create_docs_routes() -> Router<ClinicServer> {
    Router::new().route(paths::health::OPENAPI_JSON, get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_save_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/prescription/save"));
        assert!(doc.paths.paths.contains_key("/prescription/get/{uuid}"));
        assert!(doc.paths.paths.contains_key("/medicinestock"));
    }
}
