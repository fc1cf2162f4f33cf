use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::engine::llm_client::LlmError;
use crate::engine::sanitizer::sanitize_narration;

/// Decode a structured model reply into `T`.
///
/// A top-level string `narration` field is sanitised before decoding.
/// Any decode failure is reported as [`LlmError::MalformedJson`].
pub fn decode_structured<T: DeserializeOwned>(json: &str) -> Result<T, LlmError> {
    let mut value: Value =
        serde_json::from_str(json.trim()).map_err(|e| LlmError::MalformedJson(e.to_string()))?;

    if let Some(Value::String(narration)) = value.get_mut("narration") {
        *narration = sanitize_narration(narration);
    }

    serde_json::from_value(value).map_err(|e| LlmError::MalformedJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn wrong_shape_is_malformed() {
        let result: Result<Vec<String>, _> = decode_structured(r#"{"a": 1}"#);
        assert!(matches!(result, Err(LlmError::MalformedJson(_))));
    }

    #[test]
    fn objects_without_narration_pass_through() {
        let map: HashMap<String, i64> = decode_structured(r#" {"a": 1} "#).unwrap();
        assert_eq!(map["a"], 1);
    }
}
