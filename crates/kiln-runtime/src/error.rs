//! Runtime error types.

use thiserror::Error;

/// Errors surfaced by an awaited [`Blocking`](crate::executor::Blocking) handle.
#[derive(Debug, Error)]
pub enum BlockingError {
    /// The scheduled work panicked.
    #[error("background task panicked: {0}")]
    Panicked(String),

    /// The executor dropped the work before it completed.
    #[error("background task was cancelled before completion")]
    Cancelled,
}

impl BlockingError {
    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let panic = err.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Self::Panicked(message)
        } else {
            Self::Cancelled
        }
    }
}

/// Errors that can occur while retrieving external configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to extract the layered configuration.
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// The background extraction task failed.
    #[error(transparent)]
    Background(#[from] BlockingError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}

/// Result type for config retrieval operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
