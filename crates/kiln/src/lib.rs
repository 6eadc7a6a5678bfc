//! # kiln
//!
//! A plugin-configurable bootstrap layer for reactive web applications.
//!
//! External plugins, discovered at link time, mutate a shared configuration
//! context before the framework starts: registering serializers, overriding
//! defaults, attaching exception rules, swapping the runtime. The context is
//! then frozen into an immutable snapshot consumed for the rest of the
//! process lifetime.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kiln::prelude::*;
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
//!
//! let context = kiln::bootstrap(Arc::new(TypeMapLoader::new()));
//! assert!(context.serializers().contains_key("application/msgpack"));
//! ```

pub use kiln_core::{
    BoxError, ConversionError, ConversionResult, DefaultStringConverter, DefaultValidation,
    ExceptionHandler, HandledError, ImplementationLoader, InstanceArc, JsonRestClientSerializer,
    JsonSerializer, LoaderExt, PayloadSerializationStrategy, PlainTextSerializer,
    PredicateExceptionHandler, RestClientSerializer, SerializationError, SerializationResult,
    Serializer, SingleSerializerStrategy, StringConverter, TypeMapLoader, Validation,
    ValidationFailure, ValidationResult, ValidationRule, ValueHint, content_types,
};
pub use kiln_runtime::{
    Blocking, BlockingError, CONFIGURATION_PLUGINS, ConfigError, ConfigRetriever, ConfigResult,
    ConfigurationPlugin, KilnContext, LogFormat, LoggingConfig, LoggingGuard, MutableKilnContext,
    PluginCtor, RestClientSerializerMap, RuntimeHandle, RuntimeOptions, SerializerMap,
    apply_discovered_plugins, apply_plugins, bootstrap, linkme, logging,
};

/// Commonly used imports for plugin authors and framework consumers.
pub mod prelude {
    pub use kiln_core::{
        ExceptionHandler, HandledError, ImplementationLoader, LoaderExt,
        PayloadSerializationStrategy, PredicateExceptionHandler, RestClientSerializer, Serializer,
        StringConverter, TypeMapLoader, Validation, ValidationRule, content_types,
    };
    pub use kiln_runtime::{
        CONFIGURATION_PLUGINS, ConfigurationPlugin, KilnContext, MutableKilnContext, PluginCtor,
        RuntimeHandle,
    };
    pub use kiln_runtime::linkme::distributed_slice;
}
