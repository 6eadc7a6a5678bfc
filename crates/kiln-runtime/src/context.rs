//! The framework configuration context.
//!
//! [`MutableKilnContext`] is the mutable view handed to configuration plugins
//! during bootstrap. Every framework-wide singleton lives in its own lazy
//! [`Slot`]: the first read resolves a default (loader discovery, then
//! built-in fallback), caches it, and never re-resolves; an explicit setter
//! pre-empts or replaces the cached value, last write wins. Getters are
//! total — a built-in exists for every slot.
//!
//! Bootstrap is single-threaded; once plugins have run, call
//! [`freeze`](MutableKilnContext::freeze) to obtain the immutable
//! [`KilnContext`] snapshot the rest of the framework consumes. There are no
//! setters after the freeze, so configuration cannot drift after startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use kiln_core::{
    DefaultStringConverter, DefaultValidation, ExceptionHandler, ImplementationLoader,
    JsonRestClientSerializer, JsonSerializer, LoaderExt, PayloadSerializationStrategy,
    PlainTextSerializer, PredicateExceptionHandler, RestClientSerializer, Serializer,
    SingleSerializerStrategy, StringConverter, Validation, ValidationRule, content_types,
};

use crate::executor::{Blocking, RuntimeHandle, RuntimeOptions};
use crate::retriever::ConfigRetriever;
use crate::slot::Slot;

/// Inbound serializers keyed by content type.
pub type SerializerMap = HashMap<String, Arc<dyn Serializer>>;

/// Outbound REST client serializers keyed by content type.
pub type RestClientSerializerMap = HashMap<String, Arc<dyn RestClientSerializer>>;

/// The mutable configuration context plugins receive during bootstrap.
pub struct MutableKilnContext {
    loader: Arc<dyn ImplementationLoader>,
    serializers: Slot<Arc<SerializerMap>>,
    default_serializer: Slot<Arc<dyn Serializer>>,
    rest_client_serializers: Slot<Arc<RestClientSerializerMap>>,
    default_rest_client_serializer: Slot<Arc<dyn RestClientSerializer>>,
    payload_strategy: Slot<Arc<dyn PayloadSerializationStrategy>>,
    runtime: Slot<RuntimeHandle>,
    string_converter: Slot<Arc<dyn StringConverter>>,
    exception_handler: Slot<Arc<dyn ExceptionHandler>>,
    validation: Slot<Arc<dyn Validation>>,
    config_retriever: Slot<Arc<ConfigRetriever>>,
}

impl MutableKilnContext {
    /// Creates a context that discovers collaborators through `loader`.
    pub fn new(loader: Arc<dyn ImplementationLoader>) -> Self {
        Self {
            loader,
            serializers: Slot::empty(),
            default_serializer: Slot::empty(),
            rest_client_serializers: Slot::empty(),
            default_rest_client_serializer: Slot::empty(),
            payload_strategy: Slot::empty(),
            runtime: Slot::empty(),
            string_converter: Slot::empty(),
            exception_handler: Slot::empty(),
            validation: Slot::empty(),
            config_retriever: Slot::empty(),
        }
    }

    /// The loader this context discovers collaborators through.
    pub fn loader(&self) -> &Arc<dyn ImplementationLoader> {
        &self.loader
    }

    // ----------------------------------------
    // Serializer registry
    // ----------------------------------------

    /// The inbound serializer registry.
    ///
    /// Resolved once by merging discovered serializers (keyed by their
    /// declared content type, last registration wins) with the JSON and
    /// plain-text built-ins for any content type left unclaimed.
    pub fn serializers(&self) -> Arc<SerializerMap> {
        self.serializers.get_or_resolve(|| {
            let mut map: SerializerMap = HashMap::new();
            for serializer in self.loader.all_instances_of::<dyn Serializer>() {
                let key = serializer.content_type();
                if map.insert(key.to_string(), serializer).is_some() {
                    debug!(
                        content_type = key,
                        "Duplicate serializer for content type, last registration wins"
                    );
                }
            }
            map.entry(content_types::JSON.to_string())
                .or_insert_with(|| Arc::new(JsonSerializer));
            map.entry(content_types::PLAIN_TEXT.to_string())
                .or_insert_with(|| Arc::new(PlainTextSerializer));
            Arc::new(map)
        })
    }

    /// Registers a serializer under its declared content type.
    pub fn register_serializer(&mut self, serializer: Arc<dyn Serializer>) {
        let mut map = (*self.serializers()).clone();
        map.insert(serializer.content_type().to_string(), serializer);
        self.serializers.set(Arc::new(map));
    }

    /// Replaces the whole serializer registry.
    pub fn set_serializers(&mut self, serializers: SerializerMap) {
        self.serializers.set(Arc::new(serializers));
    }

    /// The serializer used when no content type narrows the choice.
    ///
    /// Defaults to the registry's `application/json` entry.
    pub fn default_serializer(&self) -> Arc<dyn Serializer> {
        self.default_serializer.get_or_resolve(|| {
            self.serializers()
                .get(content_types::JSON)
                .cloned()
                .unwrap_or_else(|| Arc::new(JsonSerializer))
        })
    }

    /// Overrides the default serializer.
    pub fn set_default_serializer(&mut self, serializer: Arc<dyn Serializer>) {
        self.default_serializer.set(serializer);
    }

    // ----------------------------------------
    // REST client serializer registry
    // ----------------------------------------

    /// The outbound REST client serializer registry.
    ///
    /// Same merge rule as [`serializers`](Self::serializers); the only
    /// built-in is JSON.
    pub fn rest_client_serializers(&self) -> Arc<RestClientSerializerMap> {
        self.rest_client_serializers.get_or_resolve(|| {
            let mut map: RestClientSerializerMap = HashMap::new();
            for serializer in self.loader.all_instances_of::<dyn RestClientSerializer>() {
                let key = serializer.content_type();
                if map.insert(key.to_string(), serializer).is_some() {
                    debug!(
                        content_type = key,
                        "Duplicate REST client serializer, last registration wins"
                    );
                }
            }
            map.entry(content_types::JSON.to_string())
                .or_insert_with(|| Arc::new(JsonRestClientSerializer));
            Arc::new(map)
        })
    }

    /// Registers a REST client serializer under its declared content type.
    pub fn register_rest_client_serializer(&mut self, serializer: Arc<dyn RestClientSerializer>) {
        let mut map = (*self.rest_client_serializers()).clone();
        map.insert(serializer.content_type().to_string(), serializer);
        self.rest_client_serializers.set(Arc::new(map));
    }

    /// The REST client serializer used when no content type narrows the
    /// choice. Defaults to the registry's `application/json` entry.
    pub fn default_rest_client_serializer(&self) -> Arc<dyn RestClientSerializer> {
        self.default_rest_client_serializer.get_or_resolve(|| {
            self.rest_client_serializers()
                .get(content_types::JSON)
                .cloned()
                .unwrap_or_else(|| Arc::new(JsonRestClientSerializer))
        })
    }

    /// Overrides the default REST client serializer.
    pub fn set_default_rest_client_serializer(
        &mut self,
        serializer: Arc<dyn RestClientSerializer>,
    ) {
        self.default_rest_client_serializer.set(serializer);
    }

    // ----------------------------------------
    // Singleton collaborators
    // ----------------------------------------

    /// The payload serialization policy. Defaults to the single-serializer
    /// strategy.
    pub fn payload_serialization_strategy(&self) -> Arc<dyn PayloadSerializationStrategy> {
        self.payload_strategy.get_or_resolve(|| {
            self.loader
                .any_instance_of::<dyn PayloadSerializationStrategy>()
                .unwrap_or_else(|| Arc::new(SingleSerializerStrategy))
        })
    }

    /// Overrides the payload serialization policy.
    pub fn set_payload_serialization_strategy(
        &mut self,
        strategy: Arc<dyn PayloadSerializationStrategy>,
    ) {
        self.payload_strategy.set(strategy);
    }

    /// The reactive runtime instance.
    ///
    /// Resolution order: a discovered [`RuntimeHandle`], then the ambient
    /// runtime of the calling thread, then a freshly built runtime using
    /// discovered [`RuntimeOptions`] (or defaults).
    pub fn runtime(&self) -> RuntimeHandle {
        self.runtime.get_or_resolve(|| {
            if let Some(discovered) = self.loader.any_instance_of::<RuntimeHandle>() {
                return (*discovered).clone();
            }
            if let Some(ambient) = RuntimeHandle::current() {
                return ambient;
            }
            let options = self
                .loader
                .any_instance_of::<RuntimeOptions>()
                .map(|o| (*o).clone())
                .unwrap_or_default();
            debug!(thread_name = %options.thread_name, "Building a fresh runtime for the context");
            // Only fails when the OS cannot spawn threads, which is
            // unrecoverable this early in bootstrap.
            RuntimeHandle::build(&options).expect("failed to spawn runtime threads")
        })
    }

    /// Overrides the runtime instance.
    pub fn set_runtime(&mut self, runtime: RuntimeHandle) {
        self.runtime.set(runtime);
    }

    /// The parameter string converter. Defaults to the built-in converter.
    pub fn string_converter(&self) -> Arc<dyn StringConverter> {
        self.string_converter.get_or_resolve(|| {
            self.loader
                .any_instance_of::<dyn StringConverter>()
                .unwrap_or_else(|| Arc::new(DefaultStringConverter))
        })
    }

    /// Overrides the string converter.
    pub fn set_string_converter(&mut self, converter: Arc<dyn StringConverter>) {
        self.string_converter.set(converter);
    }

    /// The unhandled-error mapper. Defaults to a predicate handler with no
    /// rules (everything maps to an opaque 500).
    pub fn exception_handler(&self) -> Arc<dyn ExceptionHandler> {
        self.exception_handler.get_or_resolve(|| {
            self.loader
                .any_instance_of::<dyn ExceptionHandler>()
                .unwrap_or_else(|| Arc::new(PredicateExceptionHandler::new()))
        })
    }

    /// Overrides the exception handler.
    pub fn set_exception_handler(&mut self, handler: Arc<dyn ExceptionHandler>) {
        self.exception_handler.set(handler);
    }

    /// The validation engine. Defaults to [`DefaultValidation`] seeded with
    /// every discovered [`ValidationRule`].
    pub fn validation(&self) -> Arc<dyn Validation> {
        self.validation.get_or_resolve(|| {
            self.loader
                .any_instance_of::<dyn Validation>()
                .unwrap_or_else(|| {
                    let rules = self.loader.all_instances_of::<dyn ValidationRule>();
                    Arc::new(DefaultValidation::with_rules(rules))
                })
        })
    }

    /// Overrides the validation engine.
    pub fn set_validation(&mut self, validation: Arc<dyn Validation>) {
        self.validation.set(validation);
    }

    /// The external-configuration retriever, bound to [`runtime`](Self::runtime).
    pub fn config_retriever(&self) -> Arc<ConfigRetriever> {
        self.config_retriever
            .get_or_resolve(|| Arc::new(ConfigRetriever::new(self.runtime())))
    }

    /// Overrides the config retriever.
    pub fn set_config_retriever(&mut self, retriever: Arc<ConfigRetriever>) {
        self.config_retriever.set(retriever);
    }

    // ----------------------------------------
    // Blocking offload
    // ----------------------------------------

    /// Schedules `work` on the runtime's blocking pool. See
    /// [`RuntimeHandle::compute_blocking`].
    pub fn compute_blocking<F, T>(&self, work: F) -> Blocking<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.runtime().compute_blocking(work)
    }

    /// Schedules `action` on the runtime's blocking pool. See
    /// [`RuntimeHandle::run_blocking`].
    pub fn run_blocking<F>(&self, action: F) -> Blocking<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.runtime().run_blocking(action)
    }

    // ----------------------------------------
    // Freeze
    // ----------------------------------------

    /// Resolves every remaining slot and produces the immutable snapshot the
    /// rest of the framework consumes.
    pub fn freeze(self) -> KilnContext {
        KilnContext {
            serializers: self.serializers(),
            default_serializer: self.default_serializer(),
            rest_client_serializers: self.rest_client_serializers(),
            default_rest_client_serializer: self.default_rest_client_serializer(),
            payload_strategy: self.payload_serialization_strategy(),
            runtime: self.runtime(),
            string_converter: self.string_converter(),
            exception_handler: self.exception_handler(),
            validation: self.validation(),
            config_retriever: self.config_retriever(),
        }
    }
}

impl std::fmt::Debug for MutableKilnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutableKilnContext")
            .field("serializers_resolved", &self.serializers.is_resolved())
            .field("runtime_resolved", &self.runtime.is_resolved())
            .finish_non_exhaustive()
    }
}

/// Immutable configuration snapshot produced by
/// [`MutableKilnContext::freeze`].
///
/// Cheap to clone; safe to share across request-handling threads.
#[derive(Clone)]
pub struct KilnContext {
    serializers: Arc<SerializerMap>,
    default_serializer: Arc<dyn Serializer>,
    rest_client_serializers: Arc<RestClientSerializerMap>,
    default_rest_client_serializer: Arc<dyn RestClientSerializer>,
    payload_strategy: Arc<dyn PayloadSerializationStrategy>,
    runtime: RuntimeHandle,
    string_converter: Arc<dyn StringConverter>,
    exception_handler: Arc<dyn ExceptionHandler>,
    validation: Arc<dyn Validation>,
    config_retriever: Arc<ConfigRetriever>,
}

impl KilnContext {
    /// The inbound serializer registry.
    pub fn serializers(&self) -> &Arc<SerializerMap> {
        &self.serializers
    }

    /// The default serializer.
    pub fn default_serializer(&self) -> &Arc<dyn Serializer> {
        &self.default_serializer
    }

    /// The outbound REST client serializer registry.
    pub fn rest_client_serializers(&self) -> &Arc<RestClientSerializerMap> {
        &self.rest_client_serializers
    }

    /// The default REST client serializer.
    pub fn default_rest_client_serializer(&self) -> &Arc<dyn RestClientSerializer> {
        &self.default_rest_client_serializer
    }

    /// The payload serialization policy.
    pub fn payload_serialization_strategy(&self) -> &Arc<dyn PayloadSerializationStrategy> {
        &self.payload_strategy
    }

    /// The reactive runtime instance.
    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    /// The parameter string converter.
    pub fn string_converter(&self) -> &Arc<dyn StringConverter> {
        &self.string_converter
    }

    /// The unhandled-error mapper.
    pub fn exception_handler(&self) -> &Arc<dyn ExceptionHandler> {
        &self.exception_handler
    }

    /// The validation engine.
    pub fn validation(&self) -> &Arc<dyn Validation> {
        &self.validation
    }

    /// The external-configuration retriever.
    pub fn config_retriever(&self) -> &Arc<ConfigRetriever> {
        &self.config_retriever
    }

    /// Schedules `work` on the runtime's blocking pool.
    pub fn compute_blocking<F, T>(&self, work: F) -> Blocking<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.runtime.compute_blocking(work)
    }

    /// Schedules `action` on the runtime's blocking pool.
    pub fn run_blocking<F>(&self, action: F) -> Blocking<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.runtime.run_blocking(action)
    }
}

impl std::fmt::Debug for KilnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KilnContext")
            .field("serializers", &self.serializers.len())
            .field(
                "rest_client_serializers",
                &self.rest_client_serializers.len(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{ConversionResult, HandledError, SerializationResult, TypeMapLoader, ValueHint};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn empty_context() -> MutableKilnContext {
        MutableKilnContext::new(Arc::new(TypeMapLoader::new()))
    }

    struct StubSerializer(&'static str);

    impl Serializer for StubSerializer {
        fn content_type(&self) -> &'static str {
            self.0
        }

        fn serialize(&self, _payload: &Value) -> SerializationResult<Vec<u8>> {
            Ok(Vec::new())
        }

        fn deserialize(&self, _data: &[u8]) -> SerializationResult<Value> {
            Ok(Value::Null)
        }
    }

    // ----------------------------------------
    // Serializers
    // ----------------------------------------

    #[test]
    fn registry_defaults_to_json_and_plain_text_built_ins() {
        let context = empty_context();
        let serializers = context.serializers();

        assert_eq!(serializers.len(), 2);
        assert_eq!(
            serializers[content_types::JSON].content_type(),
            content_types::JSON
        );
        assert_eq!(
            serializers[content_types::PLAIN_TEXT].content_type(),
            content_types::PLAIN_TEXT
        );
    }

    #[test]
    fn discovered_serializers_join_the_registry_and_claim_their_key() {
        let loader = TypeMapLoader::new()
            .bind::<dyn Serializer>(Arc::new(StubSerializer("application/msgpack")))
            .bind::<dyn Serializer>(Arc::new(StubSerializer(content_types::JSON)));
        let context = MutableKilnContext::new(Arc::new(loader));

        let serializers = context.serializers();
        assert_eq!(serializers.len(), 3);

        // The discovered JSON serializer pre-empts the built-in and so
        // becomes the default too.
        let discovered = &serializers[content_types::JSON];
        assert!(Arc::ptr_eq(discovered, &context.default_serializer()));

        let bytes = discovered.serialize(&json!({"ignored": true})).unwrap();
        assert!(bytes.is_empty(), "stub serializer should have been used");
    }

    #[test]
    fn serializer_registry_is_resolved_once_and_cached() {
        let context = empty_context();
        assert!(Arc::ptr_eq(&context.serializers(), &context.serializers()));
    }

    #[test]
    fn register_serializer_wins_for_its_content_type() {
        let mut context = empty_context();
        context.serializers();

        let custom: Arc<dyn Serializer> = Arc::new(StubSerializer(content_types::JSON));
        context.register_serializer(Arc::clone(&custom));

        let serializers = context.serializers();
        assert_eq!(serializers.len(), 2);
        assert!(Arc::ptr_eq(&serializers[content_types::JSON], &custom));
    }

    #[test]
    fn default_serializer_is_the_json_built_in() {
        let context = empty_context();
        let default = context.default_serializer();

        assert_eq!(default.content_type(), content_types::JSON);
        assert!(Arc::ptr_eq(
            &default,
            &context.serializers()[content_types::JSON]
        ));
    }

    #[test]
    fn explicit_default_serializer_wins_before_and_after_first_read() {
        let mut context = empty_context();
        let custom: Arc<dyn Serializer> = Arc::new(StubSerializer("application/custom"));
        context.set_default_serializer(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.default_serializer(), &custom));

        let mut context = empty_context();
        context.default_serializer();
        context.set_default_serializer(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.default_serializer(), &custom));
    }

    // ----------------------------------------
    // REST client serializers
    // ----------------------------------------

    #[test]
    fn rest_client_registry_defaults_to_the_json_built_in_only() {
        let context = empty_context();
        let serializers = context.rest_client_serializers();

        assert_eq!(serializers.len(), 1);
        assert_eq!(
            serializers[content_types::JSON].content_type(),
            content_types::JSON
        );
    }

    #[test]
    fn default_rest_client_serializer_is_json_and_overridable() {
        struct StubClientSerializer;

        impl RestClientSerializer for StubClientSerializer {
            fn content_type(&self) -> &'static str {
                "application/custom"
            }

            fn serialize_request(&self, _payload: &Value) -> SerializationResult<Vec<u8>> {
                Ok(Vec::new())
            }

            fn deserialize_response(&self, _data: &[u8]) -> SerializationResult<Value> {
                Ok(Value::Null)
            }
        }

        let mut context = empty_context();
        assert_eq!(
            context.default_rest_client_serializer().content_type(),
            content_types::JSON
        );

        let custom: Arc<dyn RestClientSerializer> = Arc::new(StubClientSerializer);
        context.set_default_rest_client_serializer(Arc::clone(&custom));
        assert!(Arc::ptr_eq(
            &context.default_rest_client_serializer(),
            &custom
        ));
    }

    // ----------------------------------------
    // Strategy / converter / handler / validation
    // ----------------------------------------

    #[test]
    fn set_serializers_replaces_the_whole_registry() {
        let mut context = empty_context();
        context.serializers();

        let custom: Arc<dyn Serializer> = Arc::new(StubSerializer("application/custom"));
        let mut replacement = SerializerMap::new();
        replacement.insert("application/custom".to_string(), Arc::clone(&custom));
        context.set_serializers(replacement);

        let serializers = context.serializers();
        assert_eq!(serializers.len(), 1);
        assert!(Arc::ptr_eq(&serializers["application/custom"], &custom));
    }

    #[test]
    fn register_rest_client_serializer_wins_for_its_content_type() {
        struct XmlClientSerializer;

        impl RestClientSerializer for XmlClientSerializer {
            fn content_type(&self) -> &'static str {
                "application/xml"
            }

            fn serialize_request(&self, _payload: &Value) -> SerializationResult<Vec<u8>> {
                Ok(Vec::new())
            }

            fn deserialize_response(&self, _data: &[u8]) -> SerializationResult<Value> {
                Ok(Value::Null)
            }
        }

        let mut context = empty_context();
        context.rest_client_serializers();

        let custom: Arc<dyn RestClientSerializer> = Arc::new(XmlClientSerializer);
        context.register_rest_client_serializer(Arc::clone(&custom));

        let serializers = context.rest_client_serializers();
        assert_eq!(serializers.len(), 2);
        assert!(Arc::ptr_eq(&serializers["application/xml"], &custom));
    }

    #[test]
    fn payload_strategy_defaults_to_single_serializer_and_caches() {
        let context = empty_context();
        let first = context.payload_serialization_strategy();
        let second = context.payload_serialization_strategy();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn explicit_payload_strategy_wins_before_and_after_first_read() {
        struct RecordingStrategy;

        impl PayloadSerializationStrategy for RecordingStrategy {
            fn serialize(
                &self,
                _payload: &Value,
                _serializer: &Arc<dyn Serializer>,
            ) -> SerializationResult<Vec<u8>> {
                Ok(b"recorded".to_vec())
            }
        }

        let custom: Arc<dyn PayloadSerializationStrategy> = Arc::new(RecordingStrategy);

        let mut context = empty_context();
        context.set_payload_serialization_strategy(Arc::clone(&custom));
        assert!(Arc::ptr_eq(
            &context.payload_serialization_strategy(),
            &custom
        ));

        let mut context = empty_context();
        context.payload_serialization_strategy();
        context.set_payload_serialization_strategy(Arc::clone(&custom));
        assert!(Arc::ptr_eq(
            &context.payload_serialization_strategy(),
            &custom
        ));
    }

    #[test]
    fn explicit_string_converter_wins_before_and_after_first_read() {
        struct UppercaseConverter;

        impl StringConverter for UppercaseConverter {
            fn convert(&self, raw: &str, _hint: ValueHint) -> ConversionResult<Value> {
                Ok(Value::String(raw.to_uppercase()))
            }
        }

        let custom: Arc<dyn StringConverter> = Arc::new(UppercaseConverter);

        let mut context = empty_context();
        context.set_string_converter(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.string_converter(), &custom));

        let mut context = empty_context();
        context.string_converter();
        context.set_string_converter(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.string_converter(), &custom));
    }

    #[test]
    fn explicit_exception_handler_wins_before_and_after_first_read() {
        let custom: Arc<dyn ExceptionHandler> = Arc::new(
            PredicateExceptionHandler::new()
                .with_rule(|_| true, |_| HandledError::new(418, "teapot")),
        );

        let mut context = empty_context();
        context.set_exception_handler(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.exception_handler(), &custom));

        let mut context = empty_context();
        context.exception_handler();
        context.set_exception_handler(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.exception_handler(), &custom));
    }

    #[test]
    fn singleton_slots_cache_and_honor_setter_overrides() {
        let mut context = empty_context();

        let converter = context.string_converter();
        assert!(Arc::ptr_eq(&converter, &context.string_converter()));

        let handler = context.exception_handler();
        assert!(Arc::ptr_eq(&handler, &context.exception_handler()));

        let validation = context.validation();
        assert!(Arc::ptr_eq(&validation, &context.validation()));

        let custom: Arc<dyn Validation> = Arc::new(DefaultValidation::new());
        context.set_validation(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.validation(), &custom));
    }

    #[test]
    fn validation_default_picks_up_discovered_rules() {
        struct RejectAll;

        impl ValidationRule for RejectAll {
            fn name(&self) -> &str {
                "reject-all"
            }

            fn apply(&self, _payload: &Value) -> kiln_core::ValidationResult {
                Err(kiln_core::ValidationFailure::new("rejected"))
            }
        }

        let loader = TypeMapLoader::new().bind::<dyn ValidationRule>(Arc::new(RejectAll));
        let context = MutableKilnContext::new(Arc::new(loader));

        assert!(context.validation().validate(&json!({})).is_err());
    }

    // ----------------------------------------
    // Runtime and blocking offload
    // ----------------------------------------

    #[tokio::test]
    async fn runtime_defaults_to_the_ambient_handle_and_caches() {
        let context = empty_context();
        let first = context.runtime();
        assert!(!first.owns_runtime());

        // Same cached handle on the second read.
        let second = context.runtime();
        assert_eq!(first.tokio_handle().id(), second.tokio_handle().id());
    }

    #[test]
    fn explicit_runtime_pre_empts_resolution() {
        let mut context = empty_context();
        let explicit = RuntimeHandle::build(&RuntimeOptions::default()).unwrap();
        context.set_runtime(explicit.clone());

        assert_eq!(
            context.runtime().tokio_handle().id(),
            explicit.tokio_handle().id()
        );
    }

    #[test]
    fn discovered_runtime_wins_over_building_a_fresh_one() {
        let discovered = RuntimeHandle::build(&RuntimeOptions::default()).unwrap();
        let loader = TypeMapLoader::new().bind::<RuntimeHandle>(Arc::new(discovered.clone()));
        let context = MutableKilnContext::new(Arc::new(loader));

        assert_eq!(
            context.runtime().tokio_handle().id(),
            discovered.tokio_handle().id()
        );
    }

    #[tokio::test]
    async fn compute_blocking_computes_in_the_background() {
        let context = empty_context();
        let computed = context.compute_blocking(|| 123).await.unwrap();
        assert_eq!(computed, 123);
    }

    #[tokio::test]
    async fn run_blocking_runs_the_action_exactly_once() {
        let context = empty_context();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        context
            .run_blocking(move || {
                assert!(!flag.swap(true, Ordering::SeqCst), "ran more than once");
            })
            .await
            .unwrap();

        assert!(ran.load(Ordering::SeqCst));
    }

    // ----------------------------------------
    // Config retriever and freeze
    // ----------------------------------------

    #[tokio::test]
    async fn config_retriever_is_bound_to_the_context_runtime() {
        let context = empty_context();
        let retriever = context.config_retriever();

        assert_eq!(
            retriever.runtime().tokio_handle().id(),
            context.runtime().tokio_handle().id()
        );
        assert!(Arc::ptr_eq(&retriever, &context.config_retriever()));
    }

    #[tokio::test]
    async fn explicit_config_retriever_wins_before_and_after_first_read() {
        let mut context = empty_context();
        let custom = Arc::new(ConfigRetriever::new(context.runtime()));
        context.set_config_retriever(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.config_retriever(), &custom));

        let mut context = empty_context();
        context.config_retriever();
        let custom = Arc::new(ConfigRetriever::new(context.runtime()));
        context.set_config_retriever(Arc::clone(&custom));
        assert!(Arc::ptr_eq(&context.config_retriever(), &custom));
    }

    #[tokio::test]
    async fn freeze_snapshots_the_resolved_values() {
        let mut context = empty_context();
        let custom: Arc<dyn Serializer> = Arc::new(StubSerializer("application/custom"));
        context.set_default_serializer(Arc::clone(&custom));
        let serializers = context.serializers();

        let frozen = context.freeze();

        assert!(Arc::ptr_eq(frozen.default_serializer(), &custom));
        assert!(Arc::ptr_eq(frozen.serializers(), &serializers));
        assert_eq!(frozen.compute_blocking(|| 5).await.unwrap(), 5);

        // Snapshots share their collaborators with clones.
        let cloned = frozen.clone();
        assert!(Arc::ptr_eq(cloned.validation(), frozen.validation()));
    }
}
