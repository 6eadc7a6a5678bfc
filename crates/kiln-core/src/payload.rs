//! Payload serialization policy.
//!
//! The strategy decides how a payload maps onto serializers: the default
//! [`SingleSerializerStrategy`] hands the whole payload to one serializer;
//! alternative strategies may delegate per-field.

use std::sync::Arc;

use serde_json::Value;

use crate::error::SerializationResult;
use crate::serializer::Serializer;

/// Policy governing how a payload is handed to serializers.
pub trait PayloadSerializationStrategy: Send + Sync {
    /// Encodes `payload` using `serializer` according to this policy.
    fn serialize(
        &self,
        payload: &Value,
        serializer: &Arc<dyn Serializer>,
    ) -> SerializationResult<Vec<u8>>;
}

/// One serializer handles the entire payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSerializerStrategy;

impl PayloadSerializationStrategy for SingleSerializerStrategy {
    fn serialize(
        &self,
        payload: &Value,
        serializer: &Arc<dyn Serializer>,
    ) -> SerializationResult<Vec<u8>> {
        serializer.serialize(payload)
    }
}
