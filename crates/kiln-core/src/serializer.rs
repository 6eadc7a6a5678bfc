//! Payload serializers keyed by content type.
//!
//! A [`Serializer`] converts between in-memory payloads
//! (`serde_json::Value`) and the wire representation of one content type.
//! The configuration context discovers serializers through the loader and
//! always fills in the JSON and plain-text built-ins for content types no
//! discovered serializer claims.

use serde_json::Value;

use crate::error::{SerializationError, SerializationResult};

/// Well-known content type identifiers.
pub mod content_types {
    /// JSON payloads.
    pub const JSON: &str = "application/json";
    /// Plain text payloads (scalars only).
    pub const PLAIN_TEXT: &str = "text/plain";
}

/// Converts between in-memory payloads and a single wire content type.
pub trait Serializer: Send + Sync {
    /// The content type this serializer claims, used as its registry key.
    fn content_type(&self) -> &'static str;

    /// Encodes a payload into wire bytes.
    fn serialize(&self, payload: &Value) -> SerializationResult<Vec<u8>>;

    /// Decodes wire bytes into a payload.
    fn deserialize(&self, data: &[u8]) -> SerializationResult<Value>;
}

// =============================================================================
// Built-ins
// =============================================================================

/// Built-in `application/json` serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn content_type(&self) -> &'static str {
        content_types::JSON
    }

    fn serialize(&self, payload: &Value) -> SerializationResult<Vec<u8>> {
        Ok(serde_json::to_vec(payload)?)
    }

    fn deserialize(&self, data: &[u8]) -> SerializationResult<Value> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Built-in `text/plain` serializer.
///
/// Only scalar payloads are representable; arrays and objects are rejected
/// with [`SerializationError::Unrepresentable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSerializer;

impl Serializer for PlainTextSerializer {
    fn content_type(&self) -> &'static str {
        content_types::PLAIN_TEXT
    }

    fn serialize(&self, payload: &Value) -> SerializationResult<Vec<u8>> {
        let text = match payload {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                return Err(SerializationError::Unrepresentable {
                    content_type: content_types::PLAIN_TEXT,
                    reason: "structured payloads have no plain-text form".to_string(),
                });
            }
        };
        Ok(text.into_bytes())
    }

    fn deserialize(&self, data: &[u8]) -> SerializationResult<Value> {
        let text =
            std::str::from_utf8(data).map_err(|e| SerializationError::InvalidPayload {
                content_type: content_types::PLAIN_TEXT,
                reason: e.to_string(),
            })?;
        Ok(Value::String(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_serializer_round_trips() {
        let serializer = JsonSerializer;
        let payload = json!({"name": "kiln", "version": 1});

        let bytes = serializer.serialize(&payload).unwrap();
        assert_eq!(serializer.deserialize(&bytes).unwrap(), payload);
    }

    #[test]
    fn json_serializer_rejects_garbage() {
        assert!(JsonSerializer.deserialize(b"not json").is_err());
    }

    #[test]
    fn plain_text_serializer_handles_scalars() {
        let serializer = PlainTextSerializer;

        assert_eq!(serializer.serialize(&json!("hi")).unwrap(), b"hi");
        assert_eq!(serializer.serialize(&json!(42)).unwrap(), b"42");
        assert_eq!(serializer.serialize(&json!(true)).unwrap(), b"true");
        assert_eq!(serializer.serialize(&Value::Null).unwrap(), b"");
    }

    #[test]
    fn plain_text_serializer_rejects_structured_payloads() {
        let serializer = PlainTextSerializer;
        assert!(serializer.serialize(&json!({"a": 1})).is_err());
        assert!(serializer.serialize(&json!([1, 2])).is_err());
    }

    #[test]
    fn plain_text_serializer_decodes_to_string() {
        let value = PlainTextSerializer.deserialize(b"hello").unwrap();
        assert_eq!(value, json!("hello"));
    }
}
