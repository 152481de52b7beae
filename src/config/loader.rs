//! Configuration Loader
//!
//! Layered loading of [`RegistrarConfig`] through the `config` crate:
//!
//! 1. Optional TOML file (explicit path, or `REGISTRAR_CONFIG_PATH`)
//! 2. Environment variables with the `REGISTRAR_` prefix and `__` as the
//!    nesting separator, e.g. `REGISTRAR_REGISTER__SERVER_LISTS`
//!
//! Later layers override earlier ones. Publisher settings are validated
//! before the configuration is handed out.

use super::error::{ConfigResult, ConfigurationError};
use super::RegistrarConfig;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "REGISTRAR_CONFIG_PATH";

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "REGISTRAR";

/// Builder-style loader for [`RegistrarConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with no file and the default environment prefix
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Loader whose file comes from `REGISTRAR_CONFIG_PATH` when set
    pub fn from_env() -> Self {
        let loader = Self::new();
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => loader.with_file(path),
            _ => loader,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> ConfigResult<RegistrarConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigurationError::FileNotFound { path: path.clone() });
            }
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: RegistrarConfig = builder.build()?.try_deserialize()?;
        loaded.publisher.validate()?;

        debug!(
            file = ?self.file,
            env_prefix = %self.env_prefix,
            register_type = %loaded.register.register_type,
            channel_buffer_size = loaded.publisher.channel_buffer_size,
            overflow_policy = ?loaded.publisher.overflow_policy,
            "Registrar configuration loaded"
        );

        Ok(loaded)
    }
}
