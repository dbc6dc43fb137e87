// In-process datastore used for development and tests
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::{DatastoreError, DatastoreResult};
use crate::query::{Filter, Query, SortDirection};
use crate::row::{Row, RowId, CREATED_TIME, ROW_ID};
use crate::store::{Datastore, QueryService, RowStore};

const CREATED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";

/// Kind of row-store write, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    row: Row,
}

#[derive(Debug)]
struct InjectedFault {
    table: String,
    kind: WriteKind,
    /// Matching writes still allowed to succeed before this one fires
    skip: u32,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<StoredRow>>,
    next_row_id: u64,
    next_seq: u64,
    faults: Vec<InjectedFault>,
}

impl State {
    /// Consume a matching fault if one is due for this write
    fn take_fault(&mut self, table: &str, kind: WriteKind) -> bool {
        let Some(index) = self
            .faults
            .iter()
            .position(|f| f.table == table && f.kind == kind)
        else {
            return false;
        };

        if self.faults[index].skip == 0 {
            self.faults.remove(index);
            true
        } else {
            self.faults[index].skip -= 1;
            false
        }
    }
}

/// Tables held in memory behind a shared lock
///
/// Cloning the handle shares the underlying tables, so a test can keep one
/// clone for inspection while the application owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatastore {
    state: Arc<RwLock<State>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `kind` write into `table` fail
    pub fn fail_next(&self, table: &str, kind: WriteKind) {
        self.fail_nth(table, kind, 1);
    }

    /// Make the `n`-th upcoming `kind` write into `table` fail (1-based)
    pub fn fail_nth(&self, table: &str, kind: WriteKind, n: u32) {
        self.state.write().faults.push(InjectedFault {
            table: table.to_string(),
            kind,
            skip: n.saturating_sub(1),
        });
    }

    /// Drop every pending injected failure
    pub fn clear_faults(&self) {
        self.state.write().faults.clear();
    }

    /// Snapshot of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .read()
            .tables
            .get(table)
            .map(|rows| rows.iter().map(|r| r.row.clone()).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.state.read().tables.get(table).map_or(0, Vec::len)
    }

    fn injected(table: &str, kind: WriteKind) -> DatastoreError {
        DatastoreError::WriteRejected {
            table: table.to_string(),
            message: format!("injected {kind:?} failure"),
        }
    }
}

#[async_trait]
impl RowStore for InMemoryDatastore {
    async fn insert(&self, table: &str, fields: Row) -> DatastoreResult<Row> {
        let mut state = self.state.write();
        if state.take_fault(table, WriteKind::Insert) {
            return Err(Self::injected(table, WriteKind::Insert));
        }

        state.next_row_id += 1;
        state.next_seq += 1;
        let row_id = state.next_row_id;
        let seq = state.next_seq;

        let mut row = fields;
        row.remove(CREATED_TIME);
        row.set(ROW_ID, Value::String(row_id.to_string()));
        row.set(
            CREATED_TIME,
            Value::String(Utc::now().format(CREATED_TIME_FORMAT).to_string()),
        );

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(StoredRow {
                seq,
                row: row.clone(),
            });

        debug!(table, row_id, "Inserted row");
        Ok(row)
    }

    async fn update(&self, table: &str, row_id: &RowId, fields: Row) -> DatastoreResult<Row> {
        let mut state = self.state.write();
        if state.take_fault(table, WriteKind::Update) {
            return Err(Self::injected(table, WriteKind::Update));
        }

        let stored = state
            .tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.row.row_id().as_ref() == Some(row_id))
            })
            .ok_or_else(|| DatastoreError::RowNotFound {
                table: table.to_string(),
                row_id: row_id.to_string(),
            })?;

        for (column, value) in fields.into_map() {
            if column == ROW_ID || column == CREATED_TIME {
                continue;
            }
            stored.row.set(column, value);
        }

        debug!(table, row_id = %row_id, "Updated row");
        Ok(stored.row.clone())
    }

    async fn delete(&self, table: &str, row_id: &RowId) -> DatastoreResult<()> {
        let mut state = self.state.write();
        if state.take_fault(table, WriteKind::Delete) {
            return Err(Self::injected(table, WriteKind::Delete));
        }

        let not_found = || DatastoreError::RowNotFound {
            table: table.to_string(),
            row_id: row_id.to_string(),
        };
        let rows = state.tables.get_mut(table).ok_or_else(not_found)?;
        let index = rows
            .iter()
            .position(|r| r.row.row_id().as_ref() == Some(row_id))
            .ok_or_else(not_found)?;
        rows.remove(index);

        debug!(table, row_id = %row_id, "Deleted row");
        Ok(())
    }
}

#[async_trait]
impl QueryService for InMemoryDatastore {
    async fn select(&self, query: &Query) -> DatastoreResult<Vec<Row>> {
        let state = self.state.read();
        let Some(rows) = state.tables.get(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&StoredRow> = rows
            .iter()
            .filter(|r| query.filters().iter().all(|f| matches_filter(&r.row, f)))
            .collect();

        if let Some((column, direction)) = query.ordering() {
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.row.get(column), b.row.get(column))
                    .then_with(|| a.seq.cmp(&b.seq));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let offset = usize::try_from(query.offset().unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let result = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|r| {
                if query.columns().is_empty() {
                    r.row.clone()
                } else {
                    r.row.project(query.columns())
                }
            })
            .collect();

        Ok(result)
    }

    async fn count(&self, query: &Query) -> DatastoreResult<u64> {
        let state = self.state.read();
        let count = state.tables.get(query.table_name()).map_or(0, |rows| {
            rows.iter()
                .filter(|r| query.filters().iter().all(|f| matches_filter(&r.row, f)))
                .count()
        });
        Ok(count as u64)
    }
}

impl Datastore for InMemoryDatastore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Textual form of a scalar, the way the query service compares values
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    let cell = row.get(&filter.column).and_then(scalar_text);
    match scalar_text(&filter.value) {
        None => cell.is_none(),
        Some(expected) => match (cell, row.get(&filter.column)) {
            (Some(actual), _) if actual == expected => true,
            (Some(_), Some(cell_value)) => {
                matches!(
                    (scalar_number(cell_value), scalar_number(&filter.value)),
                    (Some(a), Some(b)) if a == b
                )
            }
            _ => false,
        },
    }
}

/// Missing and null sort first; numbers compare numerically, everything else as text
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(_), Value::Number(_)) => scalar_number(a)
                .partial_cmp(&scalar_number(b))
                .unwrap_or(Ordering::Equal),
            _ => scalar_text(a).cmp(&scalar_text(b)),
        },
    }
}
