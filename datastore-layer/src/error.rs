use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Row {row_id} not found in table {table}")]
    RowNotFound { table: String, row_id: String },

    #[error("Write to table {table} rejected: {message}")]
    WriteRejected { table: String, message: String },

    #[error("Unexpected datastore response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DatastoreError {
    /// Whether the failure means the targeted row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatastoreError::RowNotFound { .. })
    }
}

pub type DatastoreResult<T> = Result<T, DatastoreError>;
