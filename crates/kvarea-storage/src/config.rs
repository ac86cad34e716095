//! Storage configuration.
//!
//! A [`StorageConfig`] names the namespace and the backend a
//! [`StorageArea`](crate::StorageArea) should use. Every field has a default,
//! so an empty document describes the default in-memory area.
//!
//! ```toml
//! namespace = "sessions"
//!
//! [backend]
//! kind = "remote"
//! url = "redis://127.0.0.1:6379/0"
//! ```
//!
//! The `KVAREA_URL` environment variable, when set, replaces the remote url
//! (see [`StorageConfig::apply_env`]).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::memory::MemoryDatabase;
use crate::remote::RemoteDatabase;
use crate::store::Database;

/// Environment variable overriding the remote backend url.
pub const URL_ENV_VAR: &str = "KVAREA_URL";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Root storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Namespace of the storage area. Empty by default.
    pub namespace: String,
    /// Backend selection.
    pub backend: BackendConfig,
}

/// Which backend a storage area runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// A process-local in-memory database.
    #[default]
    Memory,
    /// A remote key-value server.
    Remote {
        /// Locator, e.g. `redis://127.0.0.1:6379/0` or `mem://`.
        url: String,
    },
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl StorageConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the text is not valid TOML for this
    /// schema or fails validation.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StorageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded storage config");
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        let vars: HashMap<String, String> = std::env::vars().collect();
        self.apply_env_vars(&vars);
    }

    /// Apply environment overrides from `vars`.
    ///
    /// `KVAREA_URL` switches the backend to remote with that url.
    pub fn apply_env_vars(&mut self, vars: &HashMap<String, String>) {
        if let Some(url) = vars.get(URL_ENV_VAR).filter(|url| !url.is_empty()) {
            debug!(var = URL_ENV_VAR, "remote url taken from environment");
            self.backend = BackendConfig::Remote { url: url.clone() };
        }
    }

    /// Check cross-field rules.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if a remote backend has no url, or
    /// a remote namespace contains the `:` separator.
    pub fn validate(&self) -> StorageResult<()> {
        if let BackendConfig::Remote { url } = &self.backend {
            if url.trim().is_empty() {
                return Err(StorageError::Config(
                    "backend.url must be set for a remote backend".into(),
                ));
            }
            if self.namespace.contains(':') {
                return Err(StorageError::Config(format!(
                    "namespace {:?} must not contain ':' on a remote backend",
                    self.namespace
                )));
            }
        }
        Ok(())
    }

    /// Open the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if validation fails or the remote
    /// locator cannot be resolved.
    pub fn open_database(&self) -> StorageResult<Arc<dyn Database>> {
        self.validate()?;
        match &self.backend {
            BackendConfig::Memory => Ok(Arc::new(MemoryDatabase::new())),
            BackendConfig::Remote { url } => Ok(Arc::new(RemoteDatabase::new(url.as_str())?)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
