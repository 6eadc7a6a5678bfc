//! Conversion of raw text into typed values.
//!
//! Path and query parameters arrive as text; the [`StringConverter`] turns
//! them into `serde_json::Value`s so downstream extraction works on one
//! representation. A [`ValueHint`] narrows the target when the call site
//! knows the expected type.

use serde_json::{Number, Value};

use crate::error::{ConversionError, ConversionResult};

/// The target shape requested from a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueHint {
    /// Infer the type: boolean, then integer, then float, else text.
    #[default]
    Auto,
    /// Keep the raw text as-is.
    Text,
    /// Parse a boolean (`true` / `false`).
    Boolean,
    /// Parse a signed integer.
    Integer,
    /// Parse a floating point number.
    Float,
}

/// Converts raw parameter text into typed values.
pub trait StringConverter: Send + Sync {
    /// Converts `raw` according to `hint`.
    fn convert(&self, raw: &str, hint: ValueHint) -> ConversionResult<Value>;
}

/// Built-in converter with `Auto` inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStringConverter;

impl StringConverter for DefaultStringConverter {
    fn convert(&self, raw: &str, hint: ValueHint) -> ConversionResult<Value> {
        match hint {
            ValueHint::Text => Ok(Value::String(raw.to_string())),
            ValueHint::Boolean => raw.parse::<bool>().map(Value::Bool).map_err(|_| {
                ConversionError::Incompatible {
                    raw: raw.to_string(),
                    target: "boolean",
                }
            }),
            ValueHint::Integer => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| ConversionError::Incompatible {
                    raw: raw.to_string(),
                    target: "integer",
                }),
            ValueHint::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| ConversionError::Incompatible {
                    raw: raw.to_string(),
                    target: "float",
                }),
            ValueHint::Auto => Ok(infer(raw)),
        }
    }
}

fn infer(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
