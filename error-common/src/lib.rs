//! Process-level error handling for the clinic backend
//!
//! Request handling has its own error type at the HTTP boundary. This crate
//! covers everything around it: loading configuration, connecting the
//! datastore, binding the listener and serving.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ClinicError, Result};
//!
//! fn parse_port(raw: &str) -> Result<u16> {
//!     raw.parse()
//!         .map_err(|e| ClinicError::ConfigError(format!("invalid port {raw}: {e}")))
//! }
//!
//! assert!(parse_port("8080").is_ok());
//! assert!(matches!(parse_port("http"), Err(ClinicError::ConfigError(_))));
//! ```

pub mod types;

pub use types::*;
