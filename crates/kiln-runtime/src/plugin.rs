//! Configuration plugins and bootstrap.
//!
//! A [`ConfigurationPlugin`] mutates the shared [`MutableKilnContext`] once
//! during bootstrap: registering serializers, overriding defaults, attaching
//! exception rules. Plugins are discovered through the
//! [`CONFIGURATION_PLUGINS`] distributed slice, so a crate enables its plugin
//! just by linking:
//!
//! ```rust,ignore
//! use kiln_runtime::plugin::{CONFIGURATION_PLUGINS, ConfigurationPlugin, PluginCtor};
//! use linkme::distributed_slice;
//!
//! struct MsgpackPlugin;
//!
//! impl ConfigurationPlugin for MsgpackPlugin {
//!     fn name(&self) -> &str { "msgpack" }
//!     fn configure(&self, context: &mut MutableKilnContext) {
//!         context.register_serializer(Arc::new(MsgpackSerializer));
//!     }
//! }
//!
//! #[distributed_slice(CONFIGURATION_PLUGINS)]
//! static MSGPACK: PluginCtor = || Box::new(MsgpackPlugin);
//! ```
//!
//! Slice order is link-dependent, so plugins must be idempotent and tolerate
//! any application order.

use std::sync::Arc;

use linkme::distributed_slice;
use tracing::{debug, info};

use kiln_core::ImplementationLoader;

use crate::context::{KilnContext, MutableKilnContext};

/// A unit of bootstrap configuration contributed by an external crate.
pub trait ConfigurationPlugin: Send + Sync {
    /// Plugin name, used in logs.
    fn name(&self) -> &str {
        "configuration-plugin"
    }

    /// Applies this plugin's mutations to the shared context.
    fn configure(&self, context: &mut MutableKilnContext);
}

/// Constructor registered into [`CONFIGURATION_PLUGINS`].
pub type PluginCtor = fn() -> Box<dyn ConfigurationPlugin>;

/// Registry of discovered configuration plugin constructors.
#[distributed_slice]
pub static CONFIGURATION_PLUGINS: [PluginCtor];

/// Applies an explicit sequence of plugins to `context`.
pub fn apply_plugins<'a, I>(context: &mut MutableKilnContext, plugins: I)
where
    I: IntoIterator<Item = &'a dyn ConfigurationPlugin>,
{
    for plugin in plugins {
        debug!(plugin = plugin.name(), "Applying configuration plugin");
        plugin.configure(context);
    }
}

/// Applies every plugin registered in [`CONFIGURATION_PLUGINS`].
pub fn apply_discovered_plugins(context: &mut MutableKilnContext) {
    info!(
        count = CONFIGURATION_PLUGINS.len(),
        "Applying discovered configuration plugins"
    );
    for ctor in CONFIGURATION_PLUGINS {
        let plugin = ctor();
        debug!(plugin = plugin.name(), "Applying configuration plugin");
        plugin.configure(context);
    }
}

/// Bootstraps a frozen context: construct, apply discovered plugins, freeze.
pub fn bootstrap(loader: Arc<dyn ImplementationLoader>) -> KilnContext {
    let mut context = MutableKilnContext::new(loader);
    apply_discovered_plugins(&mut context);
    context.freeze()
}
