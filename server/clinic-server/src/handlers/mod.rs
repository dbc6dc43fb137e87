pub mod common;
pub mod health;
pub mod medicine_stock;
pub mod patients;
pub mod prescribed_medicines;
pub mod prescriptions;
