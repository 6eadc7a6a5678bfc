//! Mapping of unhandled errors to client-facing outcomes.
//!
//! The [`ExceptionHandler`] sits at the boundary between handler failures and
//! the response writer. The built-in [`PredicateExceptionHandler`] walks an
//! ordered rule list; the first rule whose predicate matches maps the error,
//! and everything else falls back to an opaque 500.

use std::sync::Arc;

use tracing::warn;

use crate::error::BoxError;

/// The client-facing outcome of an unhandled error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledError {
    /// HTTP status code to report.
    pub status: u16,
    /// Message safe to expose to the client.
    pub message: String,
}

impl HandledError {
    /// Creates a handled error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The opaque internal-error fallback.
    pub fn internal() -> Self {
        Self::new(500, "internal server error")
    }
}

/// Maps an unhandled error to a client-facing outcome. Must be total.
pub trait ExceptionHandler: Send + Sync {
    /// Maps `error` to a [`HandledError`].
    fn handle(&self, error: &BoxError) -> HandledError;
}

type Predicate = Arc<dyn Fn(&BoxError) -> bool + Send + Sync>;
type Mapper = Arc<dyn Fn(&BoxError) -> HandledError + Send + Sync>;

/// Ordered predicate/mapper rules with a 500 fallback.
#[derive(Clone, Default)]
pub struct PredicateExceptionHandler {
    rules: Vec<(Predicate, Mapper)>,
}

impl PredicateExceptionHandler {
    /// Creates a handler with no rules; every error maps to the fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules are evaluated in insertion order.
    pub fn attach<P, M>(&mut self, predicate: P, mapper: M)
    where
        P: Fn(&BoxError) -> bool + Send + Sync + 'static,
        M: Fn(&BoxError) -> HandledError + Send + Sync + 'static,
    {
        self.rules.push((Arc::new(predicate), Arc::new(mapper)));
    }

    /// Builder-style [`attach`](Self::attach).
    pub fn with_rule<P, M>(mut self, predicate: P, mapper: M) -> Self
    where
        P: Fn(&BoxError) -> bool + Send + Sync + 'static,
        M: Fn(&BoxError) -> HandledError + Send + Sync + 'static,
    {
        self.attach(predicate, mapper);
        self
    }

    /// Number of attached rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are attached.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ExceptionHandler for PredicateExceptionHandler {
    fn handle(&self, error: &BoxError) -> HandledError {
        for (predicate, mapper) in &self.rules {
            if predicate(error) {
                return mapper(error);
            }
        }
        warn!(error = %error, "No exception rule matched, falling back to 500");
        HandledError::internal()
    }
}

impl std::fmt::Debug for PredicateExceptionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateExceptionHandler")
            .field("rules", &self.rules.len())
            .finish()
    }
}
