//! In-memory registry backend.

use super::{BackendError, RegistryBackend};
use crate::events::RegistrationEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Keeps every delivered event in arrival order
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    events: Mutex<Vec<RegistrationEvent>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered events
    pub fn events(&self) -> Vec<RegistrationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryBackend for InMemoryBackend {
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
        if self.is_closed() {
            return Err(BackendError::Rejected("backend closed".to_string()));
        }
        debug!(event = %event, "Stored registration in memory");
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(path: &str) -> RegistrationEvent {
        RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .path(path)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_stores_events_in_order() {
        let backend = InMemoryBackend::new();
        backend.persist(&event("/api/a")).await.unwrap();
        backend.persist(&event("/api/b")).await.unwrap();

        let paths: Vec<String> = backend.events().iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["/api/a", "/api/b"]);
    }

    #[tokio::test]
    async fn test_rejects_after_close() {
        let backend = InMemoryBackend::new();
        backend.close().await;
        assert!(backend.is_closed());
        assert!(backend.persist(&event("/api/a")).await.is_err());
        assert!(backend.is_empty());
    }
}
