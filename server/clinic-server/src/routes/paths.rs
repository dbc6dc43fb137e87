//! Route path constants
//!
//! Used by the router and by the `#[utoipa::path]` attributes so the served
//! routes and the OpenAPI document stay in step.

/// Operational endpoints
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
}

/// Patient endpoints
pub mod patients {
    pub const ADD: &str = "/add";
    pub const ALL: &str = "/all";
    pub const PATIENT: &str = "/patient";
}

/// Prescription endpoints
pub mod prescriptions {
    pub const ADD: &str = "/prescription/add";
    pub const SAVE: &str = "/prescription/save";
    pub const ALL: &str = "/prescription/all";
    pub const GET: &str = "/prescription/get/:uuid";
    pub const UPDATE: &str = "/prescription/update/:uuid";
    pub const DELETE: &str = "/prescription/delete/:uuid";
    pub const BY_PATIENT: &str = "/prescription/patient/:patient_uuid";
}

/// Prescribed medicine endpoints
pub mod prescribed_medicines {
    pub const ADD: &str = "/prescribedmedicine/add";
    pub const ALL: &str = "/prescribedmedicine/all/:prescription_uuid";
    pub const GET: &str = "/prescribedmedicine/get/:rowid";
    pub const UPDATE: &str = "/prescribedmedicine/update/:rowid";
    pub const DELETE: &str = "/prescribedmedicine/delete/:rowid";
}

/// Medicine stock endpoints
pub mod medicine_stock {
    pub const ADD: &str = "/medicinestock/add";
    pub const ALL: &str = "/medicinestock/all";
    pub const MEDICINE: &str = "/medicinestock";
}
