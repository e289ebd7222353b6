//! Vendor response envelope
//!
//! Every API-Football endpoint wraps its payload in the same envelope: a
//! top-level `response` array, optional `paging` information, and an
//! `errors` member that is an empty array when the call succeeded but an
//! object keyed by error class (or an array of messages) when it failed.

use serde::Deserialize;
use serde_json::Value;

/// Top-level response envelope shared by every vendor endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub response: Vec<Value>,

    #[serde(default)]
    pub paging: Option<Paging>,

    #[serde(default)]
    pub errors: Value,

    #[serde(default)]
    pub results: Option<u32>,
}

/// Paging block returned by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Paging {
    pub current: Option<u32>,
    pub total: Option<u32>,
}

impl ApiEnvelope {
    /// Extract error messages regardless of which shape the vendor used.
    ///
    /// `errors` arrives as `[]`, as an array of strings, as an array of
    /// single-key objects, or as an object mapping error class to message.
    pub fn error_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        collect_messages(&self.errors, &mut messages);
        messages
    }

    /// True when the vendor reported no errors for this call
    pub fn is_clean(&self) -> bool {
        self.error_messages().is_empty()
    }

    /// Total number of pages declared by the vendor, zero when absent
    pub fn total_pages(&self) -> u32 {
        self.paging.and_then(|p| p.total).unwrap_or(0)
    }
}

fn collect_messages(errors: &Value, out: &mut Vec<String>) {
    match errors {
        Value::Array(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                collect_messages(value, out);
            }
        }
        Value::String(s) if !s.is_empty() => out.push(s.clone()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_errors_array_is_clean() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"response": [], "errors": []}"#).unwrap();
        assert!(envelope.is_clean());
    }

    #[test]
    fn test_error_object_messages_extracted() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"response": [], "errors": {"requests": "You have reached the request limit for the day"}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.error_messages(),
            vec!["You have reached the request limit for the day".to_string()]
        );
    }

    #[test]
    fn test_error_array_of_objects_extracted() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"response": [], "errors": [{"token": "Error/Missing application key"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.error_messages(), vec!["Error/Missing application key".to_string()]);
    }

    #[test]
    fn test_paging_total() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"response": [1, 2], "paging": {"current": 1, "total": 3}, "errors": []}"#,
        )
        .unwrap();
        assert_eq!(envelope.total_pages(), 3);
        assert_eq!(envelope.response.len(), 2);
    }

    #[test]
    fn test_missing_members_default() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{}"#).unwrap();
        assert!(envelope.is_clean());
        assert_eq!(envelope.total_pages(), 0);
        assert!(envelope.response.is_empty());
    }
}
