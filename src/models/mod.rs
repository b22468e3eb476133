pub mod payment;
pub mod webhook;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Current UTC time as fixed-width RFC 3339 (microseconds, `Z` suffix), so
/// stored timestamps order correctly as plain strings.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Text form of a scalar JSON value. `null` has none; strings come back
/// unquoted, numbers and booleans as written.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
