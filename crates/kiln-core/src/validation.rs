//! Payload validation engine.
//!
//! [`Validation`] is the engine contract consumed by the framework;
//! [`ValidationRule`] is the unit of validation that deployments contribute
//! through the loader. The built-in [`DefaultValidation`] applies every rule
//! in order and stops at the first failure.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::ValidationResult;

/// A single named validation rule.
pub trait ValidationRule: Send + Sync {
    /// Rule name, used in logs.
    fn name(&self) -> &str;

    /// Checks `payload`, reporting the first failure.
    fn apply(&self, payload: &Value) -> ValidationResult;
}

/// The validation engine applied to inbound payloads.
pub trait Validation: Send + Sync {
    /// Validates `payload`, reporting the first failure.
    fn validate(&self, payload: &Value) -> ValidationResult;
}

/// Built-in engine: discovered rules applied in registration order.
///
/// With no rules every payload is valid.
#[derive(Clone, Default)]
pub struct DefaultValidation {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl DefaultValidation {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine over a fixed rule list.
    pub fn with_rules(rules: Vec<Arc<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// Number of rules this engine applies.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Validation for DefaultValidation {
    fn validate(&self, payload: &Value) -> ValidationResult {
        for rule in &self.rules {
            trace!(rule = rule.name(), "Applying validation rule");
            rule.apply(payload)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for DefaultValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultValidation")
            .field("rules", &self.rules.len())
            .finish()
    }
}
