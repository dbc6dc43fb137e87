use thiserror::Error;

/// Errors that stop the clinic server from starting or serving
#[derive(Error, Debug)]
pub enum ClinicError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network communication errors (bind, accept)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Datastore setup errors
    #[error("Datastore error: {0}")]
    DatastoreError(#[from] datastore_layer::DatastoreError),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClinicError {
    /// Stable category name for structured logs
    pub fn error_type(&self) -> &'static str {
        match self {
            ClinicError::ConfigError(_) => "config",
            ClinicError::NetworkError(_) => "network",
            ClinicError::ServerError(_) => "server",
            ClinicError::DatastoreError(_) => "datastore",
            ClinicError::InternalError(_) => "internal",
            ClinicError::Other(_) => "other",
        }
    }
}

impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        ClinicError::NetworkError(err.to_string())
    }
}

/// Result type alias for process-level operations
pub type Result<T> = std::result::Result<T, ClinicError>;

/// Log an error with its category before it is returned from `main`
pub fn log_error(context: &str, error: &ClinicError) {
    tracing::error!(
        context = context,
        error_type = error.error_type(),
        error = %error,
        "Clinic server error"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_become_network_errors() {
        let err: ClinicError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert_eq!(err.error_type(), "network");
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn datastore_errors_are_wrapped() {
        let err: ClinicError =
            datastore_layer::DatastoreError::ConfigurationError("no token".to_string()).into();
        assert_eq!(err.error_type(), "datastore");
    }
}
