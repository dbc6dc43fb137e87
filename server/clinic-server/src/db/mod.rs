//! Table access for the clinic datastore

pub mod medicine_stock_repository;
pub mod patient_repository;
pub mod prescribed_medicine_repository;
pub mod prescription_repository;
pub mod table;

pub use medicine_stock_repository::{MedicineStockRepository, StockLevel, MEDICINE_STOCK_TABLE};
pub use patient_repository::{PatientRepository, PATIENT_TABLE};
pub use prescribed_medicine_repository::{PrescribedMedicineRepository, PRESCRIBED_MEDICINE_TABLE};
pub use prescription_repository::{PrescriptionHeader, PrescriptionRepository, PRESCRIPTION_TABLE};
pub use table::Table;
