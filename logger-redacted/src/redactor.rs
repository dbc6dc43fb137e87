use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Option<Regex> =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").ok();
    static ref PHONE_REGEX: Option<Regex> = Regex::new(
        r"(?:\+(?:1|91)[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b"
    )
    .ok();
    static ref AADHAAR_REGEX: Option<Regex> =
        Regex::new(r"\b[2-9][0-9]{3}[-\s]?[0-9]{4}[-\s]?[0-9]{4}\b").ok();
}

/// Keys whose values are never logged, whatever they contain
pub const DEFAULT_SENSITIVE_KEYS: [&str; 6] = [
    "Phonenumber",
    "phone",
    "AdharNumber",
    "Address",
    "MedicialHistory",
    "access_token",
];

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_aadhaar: bool,
    pub hash_for_correlation: bool,
    /// JSON object keys whose values are replaced outright (case-insensitive)
    pub sensitive_keys: Vec<String>,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_aadhaar: true,
            hash_for_correlation: true,
            sensitive_keys: DEFAULT_SENSITIVE_KEYS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            custom_patterns: Vec::new(),
        }
    }
}

/// PII redactor for log messages and JSON payloads
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        // Aadhaar runs before phones so a 12-digit number is not split
        if self.config.redact_aadhaar {
            result = self.redact_aadhaar(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Copy of a JSON value with sensitive keys masked and free text redacted
    pub fn redact_json(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut redacted = Map::with_capacity(map.len());
                for (key, inner) in map {
                    let masked = if self.is_sensitive_key(key) {
                        self.mask_value(key, inner)
                    } else {
                        self.redact_json(inner)
                    };
                    redacted.insert(key.clone(), masked);
                }
                Value::Object(redacted)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_json(v)).collect()),
            Value::String(s) => Value::String(self.redact(s)),
            other => other.clone(),
        }
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        self.config
            .sensitive_keys
            .iter()
            .any(|k| k.eq_ignore_ascii_case(key))
    }

    fn mask_value(&self, key: &str, value: &Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        if self.config.hash_for_correlation {
            let raw = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Value::String(format!("{}[{}]", key.to_ascii_uppercase(), self.hash_value(&raw)))
        } else {
            Value::String("[REDACTED]".to_string())
        }
    }

    fn redact_emails(&self, text: &str) -> String {
        let Some(regex) = EMAIL_REGEX.as_ref() else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &regex::Captures| {
                let email = &caps[0];
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    let parts: Vec<&str> = email.split('@').collect();
                    if parts.len() == 2 {
                        format!(
                            "{}***@{}***",
                            &parts[0][..1.min(parts[0].len())],
                            &parts[1][..1.min(parts[1].len())]
                        )
                    } else {
                        "***@***".to_string()
                    }
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        let Some(regex) = PHONE_REGEX.as_ref() else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", self.hash_value(&caps[0]))
                } else {
                    "(***) ***-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_aadhaar(&self, text: &str) -> String {
        let Some(regex) = AADHAAR_REGEX.as_ref() else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("AADHAAR[{}]", self.hash_value(&caps[0]))
                } else {
                    let digits: String = caps[0].chars().filter(char::is_ascii_digit).collect();
                    format!("XXXX XXXX {}", &digits[digits.len().saturating_sub(4)..])
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // first 8 bytes keep the token short
    }
}
