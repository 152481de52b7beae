//! Registry backend that announces events through the log.

use super::{BackendError, RegistryBackend};
use crate::events::RegistrationEvent;
use async_trait::async_trait;
use tracing::info;

/// Serializes each event to JSON and emits it at info level
#[derive(Debug, Clone)]
pub struct LoggingBackend {
    server_lists: String,
}

impl LoggingBackend {
    pub fn new(server_lists: impl Into<String>) -> Self {
        Self {
            server_lists: server_lists.into(),
        }
    }

    pub fn render(event: &RegistrationEvent) -> Result<String, BackendError> {
        Ok(serde_json::to_string(event)?)
    }
}

#[async_trait]
impl RegistryBackend for LoggingBackend {
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
        let payload = Self::render(event)?;
        info!(
            server_lists = %self.server_lists,
            app_name = %event.app_name(),
            path = %event.path(),
            payload = %payload,
            "REGISTRATION_ANNOUNCED"
        );
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "log"
    }
}
