//! CSV Plugin Example
//!
//! Demonstrates the plugin-driven bootstrap lifecycle:
//!
//! 1. A [`ConfigurationPlugin`] is registered at link time through the
//!    [`CONFIGURATION_PLUGINS`] distributed slice.
//! 2. `kiln::bootstrap` constructs the mutable context, applies every linked
//!    plugin, and freezes the result into an immutable snapshot.
//! 3. The snapshot serves the merged serializer registry and the blocking
//!    offload facade for the rest of the process lifetime.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package csv-plugin
//! KILN_APP__NAME=demo cargo run --package csv-plugin
//! ```

use std::sync::Arc;

use anyhow::Result;
use kiln::prelude::*;
use linkme::distributed_slice;
use kiln::{HandledError, SerializationError, SerializationResult, TypeMapLoader};
use serde_json::Value;
use tracing::info;

// ============================================================================
// A custom serializer for flat payloads
// ============================================================================

/// Serializes flat JSON objects as a single `header\nrow` CSV record.
struct CsvSerializer;

impl Serializer for CsvSerializer {
    fn content_type(&self) -> &'static str {
        "text/csv"
    }

    fn serialize(&self, payload: &Value) -> SerializationResult<Vec<u8>> {
        let object = payload
            .as_object()
            .ok_or_else(|| SerializationError::Unrepresentable {
                content_type: "text/csv",
                reason: "only flat objects map onto a CSV record".to_string(),
            })?;

        let headers: Vec<&str> = object.keys().map(String::as_str).collect();
        let row: Vec<String> = object
            .values()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        Ok(format!("{}\n{}", headers.join(","), row.join(",")).into_bytes())
    }

    fn deserialize(&self, data: &[u8]) -> SerializationResult<Value> {
        let text = String::from_utf8_lossy(data);
        let mut lines = text.lines();
        let headers = lines.next().unwrap_or_default();
        let row = lines.next().unwrap_or_default();

        let record: serde_json::Map<String, Value> = headers
            .split(',')
            .zip(row.split(','))
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        Ok(Value::Object(record))
    }
}

// ============================================================================
// The plugin
// ============================================================================

struct CsvPlugin;

impl ConfigurationPlugin for CsvPlugin {
    fn name(&self) -> &str {
        "csv"
    }

    fn configure(&self, context: &mut MutableKilnContext) {
        context.register_serializer(Arc::new(CsvSerializer));
        context.set_exception_handler(Arc::new(PredicateExceptionHandler::new().with_rule(
            |e| e.downcast_ref::<std::io::Error>().is_some(),
            |_| HandledError::new(404, "not found"),
        )));
    }
}

#[distributed_slice(CONFIGURATION_PLUGINS)]
static CSV: kiln::PluginCtor = || Box::new(CsvPlugin);

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = kiln_runtime_logging();

    // Apply every linked plugin and freeze the configuration.
    let context = kiln::bootstrap(Arc::new(TypeMapLoader::new()));

    let mut registered: Vec<&str> = context.serializers().keys().map(String::as_str).collect();
    registered.sort_unstable();
    info!(serializers = ?registered, "Bootstrap complete");

    // The plugin's serializer participates like any built-in.
    let csv = &context.serializers()["text/csv"];
    let record = serde_json::json!({"name": "kiln", "port": 8080});
    let encoded = csv.serialize(&record)?;
    info!(csv = %String::from_utf8_lossy(&encoded), "Encoded a record");

    // External configuration, off the event loop.
    let config = context.config_retriever().retrieve().await?;
    info!(?config, "Retrieved external configuration");

    // Blocking offload through the frozen snapshot.
    let checksum = context
        .compute_blocking(move || encoded.iter().map(|b| *b as u64).sum::<u64>())
        .await?;
    info!(checksum, "Computed in the background");

    Ok(())
}

fn kiln_runtime_logging() -> kiln::LoggingGuard {
    kiln::logging::init_from_config(&kiln::LoggingConfig::default())
}
