//! # Registry Backends
//!
//! The sink side of the registration pipeline.
//!
//! ## Overview
//!
//! A [`RegistryBackend`] persists or announces [`RegistrationEvent`]s to an
//! external coordination system. Transport, serialization and storage are
//! the backend's business. The delivery worker only ever calls
//! [`RegistryBackend::persist`], one event at a time, from its own thread.
//!
//! ## Available Backends
//!
//! - **InMemoryBackend**: keeps every delivered event, for local runs and tests
//! - **LoggingBackend**: announces events as JSON through `tracing`
//!
//! Further backends are plugged in through [`BackendFactory`], keyed by the
//! configured `register_type`.
//!
//! ## Architecture
//!
//! ```text
//! RegisterCenterConfig.register_type
//!          |
//!          v
//!   BackendFactory::create ──> Arc<dyn RegistryBackend>
//!                                      |
//!                          RegistrationPublisher::start
//! ```

pub mod factory;
pub mod logging;
pub mod memory;

use crate::events::RegistrationEvent;
use async_trait::async_trait;
use thiserror::Error;

pub use factory::{BackendConstructor, BackendFactory};
pub use logging::LoggingBackend;
pub use memory::InMemoryBackend;

/// Errors a backend may report for a single delivery
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Registry at '{server_lists}' unavailable: {reason}")]
    Unavailable { server_lists: String, reason: String },
    #[error("Registry rejected event: {0}")]
    Rejected(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend initialization failed: {0}")]
    Initialization(String),
}

/// Pluggable registry sink
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Persist or announce one event
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError>;

    /// Name used in logs and status reports
    fn backend_name(&self) -> &str {
        "unnamed_backend"
    }

    /// Release connections; called once after the shutdown drain
    async fn close(&self) {}
}
