//! Unified error types for the kiln core contracts.
//!
//! Runtime-level errors (blocking offload, config retrieval) live in
//! `kiln-runtime`.

use thiserror::Error;

/// Type-erased error used at dynamic seams such as the exception handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Serialization Errors
// =============================================================================

/// Errors that can occur while serializing or deserializing a payload.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// JSON encoding or decoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The payload shape is not representable in the target content type.
    #[error("payload not representable as '{content_type}': {reason}")]
    Unrepresentable {
        /// Content type that rejected the payload.
        content_type: &'static str,
        /// Reason for rejection.
        reason: String,
    },

    /// The raw bytes were not valid for the content type.
    #[error("invalid '{content_type}' payload: {reason}")]
    InvalidPayload {
        /// Content type that failed to decode.
        content_type: &'static str,
        /// Reason for failure.
        reason: String,
    },
}

/// Result type for serializer operations.
pub type SerializationResult<T> = Result<T, SerializationError>;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors that can occur converting raw text into a typed value.
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// The raw text cannot be parsed as the requested target type.
    #[error("cannot convert '{raw}' into {target}")]
    Incompatible {
        /// The raw input text.
        raw: String,
        /// Name of the requested target type.
        target: &'static str,
    },
}

/// Result type for string conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

// =============================================================================
// Validation Failures
// =============================================================================

/// A single validation failure reported by a validation rule.
#[derive(Debug, Clone, Error)]
pub struct ValidationFailure {
    /// Field path the failure refers to, when known.
    pub field: Option<String>,
    /// Human-readable failure message.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a failure not tied to a specific field.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a failure tied to a field path.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "validation failed for '{field}': {}", self.message),
            None => write!(f, "validation failed: {}", self.message),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult = Result<(), ValidationFailure>;
