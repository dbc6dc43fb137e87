//! Undo log for multi-table writes
//!
//! The datastore has no multi-statement transactions. A save records an undo
//! step after every successful mutation; if a later mutation fails, the steps
//! are replayed newest first.

use datastore_layer::{Datastore, DatastoreResult, Row, RowId};
use serde_json::Value;

use super::audit::{SaveAudit, SaveEvent};
use crate::db::MEDICINE_STOCK_TABLE;
use crate::middleware::RequestContext;

/// A single undo step
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    /// Put a stock quantity back to its value before the save
    RestoreStock {
        row_id: RowId,
        medicine: String,
        quantity: i64,
    },
    /// Remove a row the save inserted
    DeleteRow { table: &'static str, row_id: RowId },
}

impl Compensation {
    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Compensation::RestoreStock {
                medicine, quantity, ..
            } => format!("restore {} stock to {}", medicine, quantity),
            Compensation::DeleteRow { table, row_id } => {
                format!("delete {} row {}", table, row_id)
            }
        }
    }

    async fn apply(&self, store: &dyn Datastore) -> DatastoreResult<()> {
        match self {
            Compensation::RestoreStock {
                row_id, quantity, ..
            } => {
                let fields = Row::new().with("Quantity", Value::from(*quantity));
                store.update(MEDICINE_STOCK_TABLE, row_id, fields).await?;
                Ok(())
            }
            Compensation::DeleteRow { table, row_id } => store.delete(table, row_id).await,
        }
    }
}

/// Ordered list of undo steps for one save
#[derive(Debug, Default)]
pub struct CompensationLog {
    steps: Vec<Compensation>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Apply every step in reverse order
    ///
    /// A failing step is reported to the audit sink and the remaining steps
    /// still run. Returns the number of steps that failed.
    pub async fn unwind(
        self,
        store: &dyn Datastore,
        audit: &dyn SaveAudit,
        ctx: &RequestContext,
    ) -> usize {
        let mut failures = 0;
        for step in self.steps.into_iter().rev() {
            match step.apply(store).await {
                Ok(()) => audit.record(
                    ctx,
                    SaveEvent::CompensationApplied {
                        step: step.describe(),
                    },
                ),
                Err(e) => {
                    failures += 1;
                    audit.record(
                        ctx,
                        SaveEvent::CompensationFailed {
                            step: step.describe(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }
        failures
    }
}
