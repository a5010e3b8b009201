//! Redaction of sensitive values in sample metadata

use super::models::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement for redacted values
pub const REDACTED: &str = "[redacted]";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Copy of `metadata` with emails and token-like keys redacted, recursively
pub fn sanitize_metadata(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .map(|(key, value)| (key.clone(), sanitize_entry(key, value)))
        .collect()
}

fn sanitize_entry(key: &str, value: &Value) -> Value {
    if key.to_lowercase().contains("token") {
        return Value::String(REDACTED.to_string());
    }
    sanitize_value(value)
}

fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(text) if EMAIL_PATTERN.is_match(text.trim()) => {
            Value::String(REDACTED.to_string())
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_metadata(map)),
        other => other.clone(),
    }
}
