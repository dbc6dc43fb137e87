//! PII redaction for clinic log output
//!
//! Patient records carry phone numbers, Aadhaar numbers, postal addresses and
//! medical history. None of it may reach the logs in clear text. Everything
//! that logs a patient payload passes it through a [`PiiRedactor`] first.
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: asha@example.com → EMAIL[hash]
//! - **Phone Numbers**: +91 98765 43210 or (555) 123-4567 → PHONE[hash]
//! - **Aadhaar Numbers**: 2345 6789 0123 → AADHAAR[hash]
//! - **Sensitive JSON keys**: `Phonenumber`, `AdharNumber`, `Address`,
//!   `MedicialHistory` values are replaced wholesale in [`PiiRedactor::redact_json`]
//!
//! Hashes are a truncated SHA-256 so the same value redacts to the same token,
//! which keeps log lines correlatable.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{PiiRedactor, RedactionConfig};
//! use serde_json::json;
//!
//! let redactor = PiiRedactor::new(RedactionConfig::default());
//! let line = redactor.redact("Patient reachable at 9876543210");
//! assert!(!line.contains("9876543210"));
//!
//! let payload = redactor.redact_json(&json!({"Name": "Asha", "Phonenumber": "9876543210"}));
//! assert_ne!(payload["Phonenumber"], json!("9876543210"));
//! ```

pub mod macros;
pub mod redactor;

pub use redactor::*;

/// Shared redactor with the default configuration
pub fn default_redactor() -> &'static PiiRedactor {
    &DEFAULT_REDACTOR
}

lazy_static::lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::new(RedactionConfig::default());
}
