pub mod audit;
pub mod compensation;
pub mod dosage;
pub mod prescription_save;
pub mod stock_locks;

pub use audit::{RecordingAudit, SaveAudit, SaveEvent, SaveMode, TracingAudit};
pub use compensation::{Compensation, CompensationLog};
pub use prescription_save::{
    PrescriptionSaveService, SavePrescriptionRequest, SaveError, SavedPrescription,
};
pub use stock_locks::{StockGuard, StockLocks};
