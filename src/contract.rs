//! Boundary between free-text model responses and typed role records.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("response is not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    SchemaViolation(String),
}

/// Decode a model response into `T`.
///
/// The raw text is parsed as JSON; if that fails, fence markers are stripped
/// and parsing is retried once. Anything still unparseable is a malformed
/// response. A parsed value that is not an object, lacks a required field or
/// carries a wrong-typed field is a schema violation.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, ContractError> {
    let value = parse_value(raw)?;
    if !value.is_object() {
        return Err(ContractError::SchemaViolation(format!(
            "expected a JSON object, got {}",
            kind_of(&value)
        )));
    }
    serde_json::from_value(value).map_err(|err| ContractError::SchemaViolation(err.to_string()))
}

fn parse_value(raw: &str) -> Result<Value, ContractError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_str::<Value>(strip_fences(raw))
            .map_err(|err| ContractError::MalformedResponse(err.to_string())),
    }
}

/// Remove a leading ```` ```lang ```` fence and a trailing ```` ``` ```` fence.
pub(crate) fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    use crate::schema::TaskSpec;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Judged {
        success: bool,
        reason: String,
    }

    #[test]
    fn decodes_plain_json() {
        let judged: Judged = decode(r#"{"success": true, "reason": "All 3 tests passed."}"#).unwrap();
        assert_eq!(
            judged,
            Judged {
                success: true,
                reason: "All 3 tests passed.".to_string()
            }
        );
    }

    #[test]
    fn decodes_fenced_json_on_fallback() {
        let raw = "```json\n{\"success\": false, \"reason\": \"1 failed\"}\n```";
        let judged: Judged = decode(raw).unwrap();
        assert!(!judged.success);
        assert_eq!(judged.reason, "1 failed");
    }

    #[test]
    fn decodes_single_line_fence() {
        let judged: Judged = decode("```json {\"success\": true, \"reason\": \"ok\"}```").unwrap();
        assert!(judged.success);
    }

    #[test]
    fn prose_is_malformed() {
        let err = decode::<Judged>("Sure! The tests passed.").unwrap_err();
        assert!(matches!(err, ContractError::MalformedResponse(_)));
    }

    #[test]
    fn fence_around_garbage_is_malformed() {
        let err = decode::<Judged>("```json\n{\"success\": tru\n```").unwrap_err();
        assert!(matches!(err, ContractError::MalformedResponse(_)));
    }

    #[test]
    fn prose_around_json_is_not_repaired() {
        let err = decode::<Judged>("Here you go: {\"success\": true, \"reason\": \"ok\"}").unwrap_err();
        assert!(matches!(err, ContractError::MalformedResponse(_)));
    }

    #[test]
    fn missing_field_is_schema_violation() {
        let err = decode::<Judged>(r#"{"success": true}"#).unwrap_err();
        match err {
            ContractError::SchemaViolation(detail) => assert!(detail.contains("reason")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_schema_violation() {
        let err = decode::<Judged>(r#"{"success": "yes", "reason": "ok"}"#).unwrap_err();
        assert!(matches!(err, ContractError::SchemaViolation(_)));
    }

    #[test]
    fn non_object_is_schema_violation() {
        let err = decode::<Judged>(r#"[true, "ok"]"#).unwrap_err();
        assert_eq!(
            err,
            ContractError::SchemaViolation("expected a JSON object, got an array".to_string())
        );
    }

    #[test]
    fn empty_object_is_schema_violation_not_default() {
        let err = decode::<TaskSpec>("{}").unwrap_err();
        assert!(matches!(err, ContractError::SchemaViolation(_)));
    }

    #[test]
    fn decoding_is_idempotent_on_round_trip() {
        let raw = "```json\n{\"filename\": \"math_ops.py\", \"function_name\": \"factorial\", \"description\": \"n!\", \"steps\": [\"a\", \"b\"]}\n```";
        let first: TaskSpec = decode(raw).unwrap();
        let second: TaskSpec = decode(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn round_trip_holds_for_arbitrary_payloads() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Source {
            file_content: String,
        }

        let original = Source {
            file_content: "def f(x):\n    return \"```\"\n".to_string(),
        };
        let decoded: Source = decode(&serde_json::to_string(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn strip_fences_leaves_bare_text() {
        assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_fences("```\n{}\n```\n"), "{}");
    }
}
