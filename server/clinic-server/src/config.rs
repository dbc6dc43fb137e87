//! Server configuration
//!
//! Values come from an optional config file, overridden by `CLINIC_*`
//! environment variables (nested keys use `__`, e.g.
//! `CLINIC_DATASTORE__ACCESS_TOKEN`), overridden in turn by CLI flags.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use datastore_layer::CatalystConfig;
use error_common::{ClinicError, Result};
use serde::{Deserialize, Serialize};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "clinic-server.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub datastore: DatastoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Which datastore backend serves the tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreBackend {
    #[default]
    Memory,
    Catalyst,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatastoreConfig {
    #[serde(default)]
    pub backend: DatastoreBackend,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing)]
    pub access_token: String,
    #[serde(default = "default_datastore_timeout")]
    pub timeout_secs: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            backend: DatastoreBackend::default(),
            base_url: String::new(),
            project_id: String::new(),
            access_token: String::new(),
            timeout_secs: default_datastore_timeout(),
        }
    }
}

impl DatastoreConfig {
    /// Connection settings for the Catalyst backend
    pub fn catalyst(&self) -> CatalystConfig {
        CatalystConfig {
            base_url: self.base_url.clone(),
            project_id: self.project_id.clone(),
            access_token: self.access_token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_datastore_timeout() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_per_page() -> u64 {
    50
}

fn default_max_per_page() -> u64 {
    200
}

impl AppConfig {
    /// Load configuration from an optional file plus `CLINIC_*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Config::builder();
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("CLINIC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ClinicError::ConfigError(format!("failed to load {}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints the deserializer cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pagination.max_per_page == 0 {
            return Err(ClinicError::ConfigError(
                "pagination.max_per_page must be positive".to_string(),
            ));
        }
        if self.datastore.backend == DatastoreBackend::Catalyst {
            self.datastore.catalyst().validate()?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs.max(1))
    }
}
