//! # Kiln Core
//!
//! Collaborator contracts and built-in defaults for the kiln framework.
//!
//! This crate defines the seams the configuration context wires together at
//! bootstrap:
//!
//! - **Discovery**: [`ImplementationLoader`] and the explicit
//!   [`TypeMapLoader`] registry.
//! - **Serialization**: [`Serializer`] (inbound) and [`RestClientSerializer`]
//!   (outbound), keyed by content type, with JSON and plain-text built-ins.
//! - **Serialization policy**: [`PayloadSerializationStrategy`] with the
//!   [`SingleSerializerStrategy`] default.
//! - **Parameter conversion**: [`StringConverter`].
//! - **Error mapping**: [`ExceptionHandler`] with the predicate-based
//!   built-in.
//! - **Validation**: [`Validation`] over discovered [`ValidationRule`]s.
//!
//! Every contract has a built-in default, so configuration access is total:
//! absence of a discovered implementation never fails, it falls back.

pub mod convert;
pub mod error;
pub mod exception;
pub mod loader;
pub mod payload;
pub mod rest_client;
pub mod serializer;
pub mod validation;

pub use convert::{DefaultStringConverter, StringConverter, ValueHint};
pub use error::{
    BoxError, ConversionError, ConversionResult, SerializationError, SerializationResult,
    ValidationFailure, ValidationResult,
};
pub use exception::{ExceptionHandler, HandledError, PredicateExceptionHandler};
pub use loader::{ImplementationLoader, InstanceArc, LoaderExt, TypeMapLoader};
pub use payload::{PayloadSerializationStrategy, SingleSerializerStrategy};
pub use rest_client::{JsonRestClientSerializer, RestClientSerializer};
pub use serializer::{JsonSerializer, PlainTextSerializer, Serializer, content_types};
pub use validation::{DefaultValidation, Validation, ValidationRule};
