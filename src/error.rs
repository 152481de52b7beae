//! Error types for the registrar client.
//!

use crate::config::ConfigurationError;
use crate::registry::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Invalid registration event: {0}")]
    InvalidEvent(String),
    #[error("Failed to spawn delivery worker: {0}")]
    WorkerSpawn(String),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl RegistrarError {
    /// Missing or empty field on a registration event
    pub fn missing_event_field(field: &str) -> Self {
        RegistrarError::InvalidEvent(format!("'{field}' must not be empty"))
    }
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
