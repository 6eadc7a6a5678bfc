//! External configuration retrieval using figment.
//!
//! The retriever layers a TOML file (path from `KILN_CONFIG_FILE`, defaulting
//! to `kiln.toml`) under `KILN_`-prefixed environment variables with `__` as
//! the section separator:
//!
//! - `KILN_LOGGING__LEVEL=debug` -> `logging.level = "debug"`
//! - `KILN_SERVER__PORT=9000` -> `server.port = 9000`
//!
//! It is bound to the context's [`RuntimeHandle`] so that
//! [`retrieve`](ConfigRetriever::retrieve) can push file and environment
//! reads onto the blocking pool instead of the event loop.

use figment::Figment;
use figment::providers::Env;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use serde_json::Value;

use crate::error::ConfigResult;
use crate::executor::RuntimeHandle;

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "KILN_CONFIG_FILE";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "kiln.toml";

/// Layered external-configuration retriever bound to the runtime.
#[derive(Debug)]
pub struct ConfigRetriever {
    figment: Figment,
    runtime: RuntimeHandle,
}

impl ConfigRetriever {
    /// Creates a retriever with the default file + environment stack.
    pub fn new(runtime: RuntimeHandle) -> Self {
        let mut figment = Figment::new();

        #[cfg(feature = "toml-config")]
        {
            let path = std::env::var(CONFIG_FILE_ENV)
                .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("KILN_").split("__"));
        Self { figment, runtime }
    }

    /// Creates a retriever over a caller-supplied figment stack.
    pub fn with_figment(runtime: RuntimeHandle, figment: Figment) -> Self {
        Self { figment, runtime }
    }

    /// Merges an additional TOML file into the stack.
    #[cfg(feature = "toml-config")]
    pub fn file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.figment = self.figment.merge(Toml::file(path.as_ref()));
        self
    }

    /// The runtime this retriever schedules blocking reads on.
    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    /// Extracts the merged configuration off the event loop.
    pub async fn retrieve(&self) -> ConfigResult<Value> {
        let figment = self.figment.clone();
        let extracted = self
            .runtime
            .compute_blocking(move || figment.extract::<Value>())
            .await?;
        Ok(extracted?)
    }

    /// Extracts the merged configuration on the calling thread.
    pub fn retrieve_sync(&self) -> ConfigResult<Value> {
        Ok(self.figment.extract::<Value>()?)
    }
}
