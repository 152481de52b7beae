//! # Backend Factory
//!
//! Maps a configured `register_type` to a backend constructor.
//!
//! ## Overview
//!
//! Register types are matched case-insensitively. The factory starts with
//! the built-in `memory` and `log` backends; applications add their own
//! transports with [`BackendFactory::register`] before bootstrapping.
//!
//! ## Usage
//!
//! ```rust
//! use registrar_client::config::RegisterCenterConfig;
//! use registrar_client::registry::BackendFactory;
//!
//! let factory = BackendFactory::with_defaults();
//! let config = RegisterCenterConfig::new("memory", "local");
//! let backend = factory.create(&config).unwrap();
//! assert_eq!(backend.backend_name(), "memory");
//! ```

use super::{BackendError, InMemoryBackend, LoggingBackend, RegistryBackend};
use crate::config::{ConfigurationError, RegisterCenterConfig};
use crate::error::{RegistrarError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Constructor for one register type
pub type BackendConstructor = Arc<
    dyn Fn(&RegisterCenterConfig) -> std::result::Result<Arc<dyn RegistryBackend>, BackendError>
        + Send
        + Sync,
>;

/// Register-type keyed backend constructors
#[derive(Clone, Default)]
pub struct BackendFactory {
    constructors: HashMap<String, BackendConstructor>,
}

impl fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendFactory")
            .field("register_types", &self.register_types())
            .finish()
    }
}

impl BackendFactory {
    /// Empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the `memory` and `log` backends registered
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register("memory", |_config: &RegisterCenterConfig| {
            Ok(Arc::new(InMemoryBackend::new()) as Arc<dyn RegistryBackend>)
        });
        factory.register("log", |config: &RegisterCenterConfig| {
            Ok(Arc::new(LoggingBackend::new(config.server_lists.clone())) as Arc<dyn RegistryBackend>)
        });
        factory
    }

    /// Register (or replace) the constructor for a register type
    pub fn register<F>(&mut self, register_type: &str, constructor: F)
    where
        F: Fn(&RegisterCenterConfig) -> std::result::Result<Arc<dyn RegistryBackend>, BackendError>
            + Send
            + Sync
            + 'static,
    {
        let key = register_type.trim().to_ascii_lowercase();
        debug!(register_type = %key, "Registered backend constructor");
        self.constructors.insert(key, Arc::new(constructor));
    }

    pub fn supports(&self, register_type: &str) -> bool {
        self.constructors
            .contains_key(&register_type.trim().to_ascii_lowercase())
    }

    /// Sorted list of known register types
    pub fn register_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }

    /// Build the backend selected by `config.register_type`
    pub fn create(&self, config: &RegisterCenterConfig) -> Result<Arc<dyn RegistryBackend>> {
        let key = config.register_type.trim().to_ascii_lowercase();
        let constructor = self.constructors.get(&key).ok_or_else(|| {
            RegistrarError::from(ConfigurationError::unknown_register_type(
                config.register_type.clone(),
                self.register_types(),
            ))
        })?;

        let backend = constructor(config)?;
        info!(
            register_type = %key,
            backend = backend.backend_name(),
            server_lists = %config.server_lists,
            "Registry backend created"
        );
        Ok(backend)
    }
}
