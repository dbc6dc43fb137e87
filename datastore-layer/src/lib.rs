//! Tabular datastore abstraction for the clinic backend
//!
//! The managed datastore behind the clinic exposes two surfaces:
//! - a **row store** that inserts, updates and deletes single rows by their
//!   store-assigned `ROWID`
//! - a read-only **query service** that filters, counts, orders and pages rows
//!   of a named table
//!
//! There are no multi-statement transactions and no conditional writes.
//! Callers that need all-or-nothing behaviour have to compensate on their own.
//!
//! # Backends
//!
//! - [`InMemoryDatastore`] keeps tables in process memory. It is used for
//!   local development and for tests, and supports failure injection.
//! - [`CatalystDatastore`] talks to a Catalyst project over HTTPS, issuing
//!   ZCQL for reads.
//!
//! # Example Usage
//!
//! ```rust
//! use datastore_layer::{InMemoryDatastore, Query, Row, RowStore, QueryService};
//! use serde_json::json;
//!
//! # async fn demo() -> datastore_layer::DatastoreResult<()> {
//! let store = InMemoryDatastore::new();
//! let inserted = store
//!     .insert("MedicineStock", Row::new().with("Name", json!("Paracetamol")).with("Quantity", json!(10)))
//!     .await?;
//!
//! let rows = store
//!     .select(&Query::table("MedicineStock").filter_eq("Name", json!("Paracetamol")))
//!     .await?;
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].row_id(), inserted.row_id());
//! # Ok(())
//! # }
//! ```

pub mod catalyst;
pub mod error;
pub mod memory;
pub mod query;
pub mod row;
pub mod store;
pub mod zcql;

pub use catalyst::{CatalystConfig, CatalystDatastore};
pub use error::{DatastoreError, DatastoreResult};
pub use memory::{InMemoryDatastore, WriteKind};
pub use query::{Filter, Query, SortDirection};
pub use row::{Row, RowId, CREATED_TIME, ROW_ID};
pub use store::{Datastore, QueryService, RowStore};
