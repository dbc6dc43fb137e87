//! Audit trail for prescription saves
//!
//! The save orchestrator reports every step through a [`SaveAudit`] passed in
//! by the caller. Production wiring uses [`TracingAudit`]; tests use
//! [`RecordingAudit`] to assert on the sequence of events.

use datastore_layer::RowId;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::middleware::RequestContext;

/// Whether a save creates a new prescription or rewrites an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update,
}

impl SaveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SaveMode::Create => "create",
            SaveMode::Update => "update",
        }
    }
}

/// Step-level events emitted while saving a prescription
#[derive(Debug, Clone, PartialEq)]
pub enum SaveEvent {
    Started {
        mode: SaveMode,
        patient_uuid: String,
        lines: usize,
    },
    StockValidated {
        medicines: usize,
    },
    HeaderWritten {
        prescription_uuid: String,
        row_id: RowId,
    },
    LineDeleteFailed {
        row_id: RowId,
        error: String,
    },
    StockDeducted {
        medicine: String,
        previous: i64,
        remaining: i64,
    },
    LinesReconciled {
        updated: usize,
        inserted: usize,
    },
    Completed {
        prescription_uuid: String,
    },
    Failed {
        error: String,
    },
    CompensationApplied {
        step: String,
    },
    CompensationFailed {
        step: String,
        error: String,
    },
}

impl SaveEvent {
    /// Short event name used in logs and test assertions
    pub fn name(&self) -> &'static str {
        match self {
            SaveEvent::Started { .. } => "started",
            SaveEvent::StockValidated { .. } => "stock_validated",
            SaveEvent::HeaderWritten { .. } => "header_written",
            SaveEvent::LineDeleteFailed { .. } => "line_delete_failed",
            SaveEvent::StockDeducted { .. } => "stock_deducted",
            SaveEvent::LinesReconciled { .. } => "lines_reconciled",
            SaveEvent::Completed { .. } => "completed",
            SaveEvent::Failed { .. } => "failed",
            SaveEvent::CompensationApplied { .. } => "compensation_applied",
            SaveEvent::CompensationFailed { .. } => "compensation_failed",
        }
    }
}

/// Sink for prescription save events
#[cfg_attr(test, mockall::automock)]
pub trait SaveAudit: Send + Sync {
    fn record(&self, ctx: &RequestContext, event: SaveEvent);
}

/// Emits save events as structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl SaveAudit for TracingAudit {
    fn record(&self, ctx: &RequestContext, event: SaveEvent) {
        let request_id = ctx.request_id.as_str();
        let step = event.name();
        match event {
            SaveEvent::Started {
                mode,
                patient_uuid,
                lines,
            } => info!(
                request_id,
                step,
                mode = mode.as_str(),
                patient_uuid = %patient_uuid,
                lines,
                "Prescription save started"
            ),
            SaveEvent::StockValidated { medicines } => {
                info!(request_id, step, medicines, "Stock validated")
            }
            SaveEvent::HeaderWritten {
                prescription_uuid,
                row_id,
            } => info!(
                request_id,
                step,
                prescription_uuid = %prescription_uuid,
                row_id = %row_id,
                "Prescription header written"
            ),
            SaveEvent::LineDeleteFailed { row_id, error } => warn!(
                request_id,
                step,
                row_id = %row_id,
                error = %error,
                "Failed to delete prescribed medicine, continuing"
            ),
            SaveEvent::StockDeducted {
                medicine,
                previous,
                remaining,
            } => info!(
                request_id,
                step,
                medicine = %medicine,
                previous,
                remaining,
                "Stock deducted"
            ),
            SaveEvent::LinesReconciled { updated, inserted } => {
                info!(request_id, step, updated, inserted, "Prescribed medicines reconciled")
            }
            SaveEvent::Completed { prescription_uuid } => info!(
                request_id,
                step,
                prescription_uuid = %prescription_uuid,
                "Prescription saved"
            ),
            SaveEvent::Failed { error } => error!(
                request_id,
                step,
                error = %error,
                "Prescription save failed, rolling back"
            ),
            SaveEvent::CompensationApplied { step: undo } => {
                info!(request_id, step, undo = %undo, "Rollback step applied")
            }
            SaveEvent::CompensationFailed { step: undo, error } => error!(
                request_id,
                step,
                undo = %undo,
                error = %error,
                "Rollback step failed"
            ),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<SaveEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SaveEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SaveEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SaveAudit for RecordingAudit {
    fn record(&self, _ctx: &RequestContext, event: SaveEvent) {
        self.events.lock().push(event);
    }
}
