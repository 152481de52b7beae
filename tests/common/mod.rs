//! Shared helpers for registrar integration tests: backends with scripted
//! behavior and a polling wait.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use registrar_client::registry::{BackendError, RegistryBackend};
use registrar_client::RegistrationEvent;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn event(app_name: &str, path: &str) -> RegistrationEvent {
    RegistrationEvent::builder()
        .context_path("/api")
        .app_name(app_name)
        .path(path)
        .build()
        .expect("valid test event")
}

/// Records every event plus the name of the thread that persisted it
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Mutex<Vec<RegistrationEvent>>,
    threads: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RegistrationEvent> {
        self.events.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.path().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn thread_names(&self) -> Vec<String> {
        self.threads.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryBackend for RecordingBackend {
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
        let thread = std::thread::current().name().unwrap_or("unnamed").to_string();
        self.threads.lock().push(thread);
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "recording"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Fails the n-th persist call (1-based), records the rest
#[derive(Debug)]
pub struct FailingBackend {
    fail_on: usize,
    calls: AtomicUsize,
    pub inner: RecordingBackend,
}

impl FailingBackend {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
            inner: RecordingBackend::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryBackend for FailingBackend {
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(BackendError::Unavailable {
                server_lists: "test-registry:9095".to_string(),
                reason: format!("scripted failure on call {call}"),
            });
        }
        self.inner.persist(event).await
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

/// Holds every persist until the test hands out permits
#[derive(Debug)]
pub struct GatedBackend {
    gate: Semaphore,
    entered: AtomicUsize,
    pub inner: RecordingBackend,
}

impl GatedBackend {
    pub fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            inner: RecordingBackend::new(),
        }
    }

    /// Let `count` more persist calls through
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Number of persist calls that have started, released or not
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryBackend for GatedBackend {
    async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| BackendError::Rejected(e.to_string()))?;
        permit.forget();
        self.inner.persist(event).await
    }

    fn backend_name(&self) -> &str {
        "gated"
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
