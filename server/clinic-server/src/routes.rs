pub mod paths;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    handlers::{health, medicine_stock, patients, prescribed_medicines, prescriptions},
    openapi,
    server::ClinicServer,
};

/// Create health check routes
pub fn health_routes() -> Router<ClinicServer> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

/// Create patient registry routes
pub fn patient_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::patients::ADD, post(patients::create_patient))
        .route(paths::patients::ALL, get(patients::list_patients))
        .route(
            paths::patients::PATIENT,
            get(patients::get_patient_by_phone)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
}

/// Create prescription routes, including the atomic save
pub fn prescription_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::prescriptions::ADD, post(prescriptions::create_prescription))
        .route(paths::prescriptions::SAVE, post(prescriptions::save_prescription))
        .route(paths::prescriptions::ALL, get(prescriptions::list_prescriptions))
        .route(paths::prescriptions::GET, get(prescriptions::get_prescription))
        .route(paths::prescriptions::UPDATE, put(prescriptions::update_prescription))
        .route(
            paths::prescriptions::DELETE,
            delete(prescriptions::delete_prescription),
        )
        .route(paths::prescriptions::BY_PATIENT, get(prescriptions::patient_history))
}

/// Create prescribed medicine routes
pub fn prescribed_medicine_routes() -> Router<ClinicServer> {
    Router::new()
        .route(
            paths::prescribed_medicines::ADD,
            post(prescribed_medicines::create_prescribed_medicine),
        )
        .route(
            paths::prescribed_medicines::ALL,
            get(prescribed_medicines::list_prescribed_medicines),
        )
        .route(
            paths::prescribed_medicines::GET,
            get(prescribed_medicines::get_prescribed_medicine),
        )
        .route(
            paths::prescribed_medicines::UPDATE,
            put(prescribed_medicines::update_prescribed_medicine),
        )
        .route(
            paths::prescribed_medicines::DELETE,
            delete(prescribed_medicines::delete_prescribed_medicine),
        )
}

/// Create medicine inventory routes
pub fn medicine_stock_routes() -> Router<ClinicServer> {
    Router::new()
        .route(paths::medicine_stock::ADD, post(medicine_stock::create_medicine))
        .route(paths::medicine_stock::ALL, get(medicine_stock::list_medicines))
        .route(
            paths::medicine_stock::MEDICINE,
            get(medicine_stock::get_medicine_by_name)
                .put(medicine_stock::update_medicine)
                .delete(medicine_stock::delete_medicine),
        )
}

/// Create all routes
pub fn create_routes() -> Router<ClinicServer> {
    Router::new()
        .merge(health_routes())
        .merge(openapi::create_docs_routes())
        .merge(patient_routes())
        .merge(prescription_routes())
        .merge(prescribed_medicine_routes())
        .merge(medicine_stock_routes())
        .fallback(health::route_not_found)
}
