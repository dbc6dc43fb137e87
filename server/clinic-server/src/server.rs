use std::sync::Arc;

use datastore_layer::{CatalystDatastore, Datastore, InMemoryDatastore};
use error_common::Result;
use tracing::info;

use crate::config::{AppConfig, DatastoreBackend};
use crate::db::{
    MedicineStockRepository, PatientRepository, PrescribedMedicineRepository,
    PrescriptionRepository,
};
use crate::services::{PrescriptionSaveService, SaveAudit, StockLocks, TracingAudit};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct ClinicServer {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Row store and query service backing every table
    pub datastore: Arc<dyn Datastore>,
    /// Per-medicine locks serializing stock writes
    pub stock_locks: Arc<StockLocks>,
    /// Sink for prescription save events
    pub audit: Arc<dyn SaveAudit>,
}

impl ClinicServer {
    /// Create the server state, connecting the configured datastore backend
    pub fn new(config: AppConfig) -> Result<Self> {
        let datastore: Arc<dyn Datastore> = match config.datastore.backend {
            DatastoreBackend::Memory => Arc::new(InMemoryDatastore::new()),
            DatastoreBackend::Catalyst => {
                Arc::new(CatalystDatastore::new(config.datastore.catalyst())?)
            }
        };
        info!(backend = datastore.backend_name(), "Datastore initialized");
        Ok(Self::with_datastore(config, datastore))
    }

    /// Create the server state over an existing datastore
    pub fn with_datastore(config: AppConfig, datastore: Arc<dyn Datastore>) -> Self {
        Self {
            config: Arc::new(config),
            datastore,
            stock_locks: Arc::new(StockLocks::new()),
            audit: Arc::new(TracingAudit),
        }
    }

    /// Replace the save audit sink
    pub fn with_audit(mut self, audit: Arc<dyn SaveAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn patients(&self) -> PatientRepository {
        PatientRepository::new(self.datastore.clone())
    }

    pub fn prescriptions(&self) -> PrescriptionRepository {
        PrescriptionRepository::new(self.datastore.clone())
    }

    pub fn prescribed_medicines(&self) -> PrescribedMedicineRepository {
        PrescribedMedicineRepository::new(self.datastore.clone())
    }

    pub fn medicine_stock(&self) -> MedicineStockRepository {
        MedicineStockRepository::new(self.datastore.clone())
    }

    pub fn prescription_saver(&self) -> PrescriptionSaveService {
        PrescriptionSaveService::new(
            self.datastore.clone(),
            self.stock_locks.clone(),
            self.audit.clone(),
        )
    }
}
