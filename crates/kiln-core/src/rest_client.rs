//! Serializers for outbound REST client traffic.
//!
//! Separate from [`Serializer`](crate::serializer::Serializer) because the
//! inbound and outbound registries evolve independently: a deployment may
//! accept several content types while always speaking JSON to upstreams.

use serde_json::Value;

use crate::error::SerializationResult;
use crate::serializer::content_types;

/// Converts request/response payloads for an outbound client content type.
pub trait RestClientSerializer: Send + Sync {
    /// The content type this serializer claims, used as its registry key.
    fn content_type(&self) -> &'static str;

    /// Encodes an outbound request body.
    fn serialize_request(&self, payload: &Value) -> SerializationResult<Vec<u8>>;

    /// Decodes an upstream response body.
    fn deserialize_response(&self, data: &[u8]) -> SerializationResult<Value>;
}

/// Built-in `application/json` REST client serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRestClientSerializer;

impl RestClientSerializer for JsonRestClientSerializer {
    fn content_type(&self) -> &'static str {
        content_types::JSON
    }

    fn serialize_request(&self, payload: &Value) -> SerializationResult<Vec<u8>> {
        Ok(serde_json::to_vec(payload)?)
    }

    fn deserialize_response(&self, data: &[u8]) -> SerializationResult<Value> {
        Ok(serde_json::from_slice(data)?)
    }
}
