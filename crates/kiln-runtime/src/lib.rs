//! # Kiln Runtime
//!
//! Configuration context, plugin bootstrap, and executor facade for the kiln
//! framework.
//!
//! This crate provides:
//! - The mutable configuration context plugins receive during bootstrap
//!   ([`MutableKilnContext`]) and the immutable snapshot the framework
//!   consumes afterwards ([`KilnContext`]).
//! - The [`ConfigurationPlugin`] contract and linkme-based discovery.
//! - The blocking escape hatch over the reactive runtime
//!   ([`RuntimeHandle`], [`Blocking`]).
//! - Figment-based external configuration retrieval ([`ConfigRetriever`]).
//! - Configuration-driven logging setup.
//!
//! # Bootstrap lifecycle
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kiln_core::TypeMapLoader;
//! use kiln_runtime::plugin;
//!
//! // Construct, apply every linked ConfigurationPlugin, freeze.
//! let context = plugin::bootstrap(Arc::new(TypeMapLoader::new()));
//!
//! let payload = context.compute_blocking(|| load_report()).await?;
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod plugin;
pub mod retriever;

mod slot;

pub use context::{KilnContext, MutableKilnContext, RestClientSerializerMap, SerializerMap};
pub use error::{BlockingError, ConfigError, ConfigResult};
pub use executor::{Blocking, RuntimeHandle, RuntimeOptions};
pub use logging::{LogFormat, LoggingConfig, LoggingGuard};
pub use plugin::{
    CONFIGURATION_PLUGINS, ConfigurationPlugin, PluginCtor, apply_discovered_plugins,
    apply_plugins, bootstrap,
};
pub use retriever::ConfigRetriever;

// Re-exported for downstream `#[distributed_slice(CONFIGURATION_PLUGINS)]`
// registrations.
pub use linkme;
