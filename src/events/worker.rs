//! # Delivery Worker
//!
//! The single consumer of the pending-event channel.
//!
//! ## Architecture
//!
//! ```text
//! producer threads                         registration-delivery thread
//!       |                                           |
//!       | try_send(Deliver(event))                  | block_on(run())
//!       v                                           v
//! mpsc::Sender<DeliveryCommand>   ──────>   mpsc::Receiver (FIFO)
//!                                                   |
//!                                                   v
//!                                         RegistryBackend::persist
//! ```
//!
//! Events are delivered one at a time, in acceptance order. Each `persist`
//! is bounded by the delivery timeout and isolated from panics, so a bad
//! event is logged, counted and skipped without stalling the stream.
//!
//! On shutdown the worker keeps delivering what is already queued until the
//! drain deadline passes, then abandons the remainder, closes the backend
//! and exits.

use crate::config::PublisherConfig;
use crate::events::RegistrationEvent;
use crate::registry::RegistryBackend;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Commands carried by the pending-event channel
#[derive(Debug)]
pub(crate) enum DeliveryCommand {
    /// Deliver one event to the backend
    Deliver(RegistrationEvent),
    /// Everything queued ahead of this marker has been seen; stop
    Shutdown,
}

/// Snapshot of publisher counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherStats {
    /// Events accepted into the channel
    pub events_accepted: u64,
    /// Events the backend persisted successfully
    pub events_delivered: u64,
    /// Events whose delivery failed, timed out or panicked
    pub events_failed: u64,
    /// Events rejected because the channel was saturated
    pub events_dropped: u64,
    /// Events left undelivered when the shutdown drain deadline passed
    pub events_abandoned: u64,
    pub last_delivered_at: Option<DateTime<Utc>>,
    pub channel_depth: usize,
    pub channel_capacity: usize,
}

/// Outcome of a publisher shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownResult {
    pub success: bool,
    /// Events delivered (or attempted) after shutdown was requested
    pub events_drained: u64,
    /// Events discarded once the drain deadline passed
    pub events_abandoned: u64,
    pub duration_ms: u64,
}

/// Atomic statistics shared by producers and the worker
#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    pub(crate) events_accepted: AtomicU64,
    pub(crate) events_delivered: AtomicU64,
    pub(crate) events_failed: AtomicU64,
    pub(crate) events_dropped: AtomicU64,
    pub(crate) events_abandoned: AtomicU64,
    pub(crate) last_delivered_at: Mutex<Option<DateTime<Utc>>>,
}

impl AtomicStats {
    /// Outcome counters are read before `events_accepted`, so every outcome
    /// in a snapshot has its acceptance counted too
    pub(crate) fn snapshot(&self, channel_depth: usize, channel_capacity: usize) -> PublisherStats {
        let events_delivered = self.events_delivered.load(Ordering::SeqCst);
        let events_failed = self.events_failed.load(Ordering::SeqCst);
        let events_abandoned = self.events_abandoned.load(Ordering::SeqCst);
        PublisherStats {
            events_accepted: self.events_accepted.load(Ordering::SeqCst),
            events_delivered,
            events_failed,
            events_dropped: self.events_dropped.load(Ordering::SeqCst),
            events_abandoned,
            last_delivered_at: *self.last_delivered_at.lock(),
            channel_depth,
            channel_capacity,
        }
    }
}

/// Shutdown coordination between the publisher and its worker
#[derive(Debug, Default)]
pub(crate) struct ShutdownSignal {
    /// Drain deadline, set once when shutdown is requested
    deadline: Mutex<Option<Instant>>,
    requested: AtomicBool,
}

impl ShutdownSignal {
    /// Returns false if shutdown had already been requested
    pub(crate) fn request(&self, drain_timeout: Duration) -> bool {
        if self.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        *self.deadline.lock() = Some(Instant::now() + drain_timeout);
        true
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn deadline(&self) -> Option<Instant> {
        *self.deadline.lock()
    }
}

/// Consumer side of the publisher
pub(crate) struct DeliveryWorker {
    receiver: mpsc::Receiver<DeliveryCommand>,
    backend: Arc<dyn RegistryBackend>,
    stats: Arc<AtomicStats>,
    shutdown: Arc<ShutdownSignal>,
    is_running: Arc<AtomicBool>,
    config: PublisherConfig,
    publisher_id: String,
}

impl std::fmt::Debug for DeliveryWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryWorker")
            .field("publisher_id", &self.publisher_id)
            .field("backend", &self.backend.backend_name())
            .field("is_running", &self.is_running.load(Ordering::SeqCst))
            .finish()
    }
}

impl DeliveryWorker {
    pub(crate) fn new(
        receiver: mpsc::Receiver<DeliveryCommand>,
        backend: Arc<dyn RegistryBackend>,
        stats: Arc<AtomicStats>,
        shutdown: Arc<ShutdownSignal>,
        is_running: Arc<AtomicBool>,
        config: PublisherConfig,
        publisher_id: String,
    ) -> Self {
        Self {
            receiver,
            backend,
            stats,
            shutdown,
            is_running,
            config,
            publisher_id,
        }
    }

    /// Run the delivery loop until shutdown or until every sender is gone
    #[instrument(skip(self), name = "registration_delivery_loop", fields(
        publisher_id = %self.publisher_id,
        backend = %self.backend.backend_name()
    ))]
    pub(crate) async fn run(mut self) -> ShutdownResult {
        info!("Starting registration delivery loop");
        self.is_running.store(true, Ordering::SeqCst);

        let mut events_drained = 0u64;
        let mut events_abandoned = 0u64;

        while let Some(command) = self.receiver.recv().await {
            let event = match command {
                DeliveryCommand::Deliver(event) => event,
                DeliveryCommand::Shutdown => break,
            };

            if !self.shutdown.is_requested() {
                self.deliver(event, self.config.delivery_timeout()).await;
                continue;
            }

            let remaining = self
                .shutdown
                .deadline()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or_default();
            if remaining.is_zero() {
                events_abandoned += 1;
                self.stats.events_abandoned.fetch_add(1, Ordering::SeqCst);
                warn!(
                    app_name = %event.app_name(),
                    path = %event.path(),
                    "Shutdown drain deadline passed, abandoning registration"
                );
                continue;
            }

            events_drained += 1;
            self.deliver(event, remaining.min(self.config.delivery_timeout()))
                .await;
        }

        // Anything that slipped in behind the shutdown marker is not delivered
        self.receiver.close();
        while let Ok(command) = self.receiver.try_recv() {
            if let DeliveryCommand::Deliver(event) = command {
                events_abandoned += 1;
                self.stats.events_abandoned.fetch_add(1, Ordering::SeqCst);
                debug!(path = %event.path(), "Discarding registration queued after shutdown");
            }
        }

        self.backend.close().await;
        self.is_running.store(false, Ordering::SeqCst);

        info!(
            events_drained = events_drained,
            events_abandoned = events_abandoned,
            "Registration delivery loop stopped"
        );

        ShutdownResult {
            success: true,
            events_drained,
            events_abandoned,
            duration_ms: 0,
        }
    }

    /// Deliver one event; failures are logged and counted, never propagated
    async fn deliver(&self, event: RegistrationEvent, timeout: Duration) {
        let started = Instant::now();
        let attempt = AssertUnwindSafe(self.backend.persist(&event)).catch_unwind();

        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(result)) => result.map_err(|e| e.to_string()),
            Ok(Err(_)) => Err("backend panicked during persist".to_string()),
            Err(_) => Err(format!("persist timed out after {}ms", timeout.as_millis())),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                self.stats.events_delivered.fetch_add(1, Ordering::SeqCst);
                *self.stats.last_delivered_at.lock() = Some(Utc::now());
                debug!(
                    app_name = %event.app_name(),
                    path = %event.path(),
                    rule_name = %event.rule_name(),
                    elapsed_ms = elapsed_ms,
                    "Registration delivered"
                );
            }
            Err(reason) => {
                self.stats.events_failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    app_name = %event.app_name(),
                    context_path = %event.context_path(),
                    path = %event.path(),
                    rule_name = %event.rule_name(),
                    rpc_type = %event.rpc_type(),
                    elapsed_ms = elapsed_ms,
                    error = %reason,
                    "Failed to deliver registration"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BackendError, InMemoryBackend};
    use async_trait::async_trait;

    fn event(path: &str) -> RegistrationEvent {
        RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .path(path)
            .build()
            .unwrap()
    }

    struct PanickingBackend {
        inner: InMemoryBackend,
    }

    #[async_trait]
    impl RegistryBackend for PanickingBackend {
        async fn persist(&self, event: &RegistrationEvent) -> Result<(), BackendError> {
            if event.path().ends_with("boom") {
                panic!("backend exploded");
            }
            self.inner.persist(event).await
        }
    }

    fn worker_for(
        backend: Arc<dyn RegistryBackend>,
        capacity: usize,
    ) -> (DeliveryWorker, mpsc::Sender<DeliveryCommand>, Arc<AtomicStats>, Arc<ShutdownSignal>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let stats = Arc::new(AtomicStats::default());
        let shutdown = Arc::new(ShutdownSignal::default());
        let worker = DeliveryWorker::new(
            receiver,
            backend,
            Arc::clone(&stats),
            Arc::clone(&shutdown),
            Arc::new(AtomicBool::new(false)),
            PublisherConfig::default(),
            "pub_test".to_string(),
        );
        (worker, sender, stats, shutdown)
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order_and_closes_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let (worker, sender, stats, _) = worker_for(backend.clone(), 8);

        for path in ["/api/a", "/api/b", "/api/c"] {
            sender.try_send(DeliveryCommand::Deliver(event(path))).unwrap();
        }
        sender.try_send(DeliveryCommand::Shutdown).unwrap();

        let result = worker.run().await;
        assert!(result.success);

        let paths: Vec<String> = backend.events().iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["/api/a", "/api/b", "/api/c"]);
        assert_eq!(stats.events_delivered.load(Ordering::SeqCst), 3);
        assert!(backend.is_closed());
    }

    #[tokio::test]
    async fn test_worker_survives_backend_panic() {
        let backend = Arc::new(PanickingBackend {
            inner: InMemoryBackend::new(),
        });
        let (worker, sender, stats, _) = worker_for(backend.clone(), 8);

        for path in ["/api/a", "/api/boom", "/api/c"] {
            sender.try_send(DeliveryCommand::Deliver(event(path))).unwrap();
        }
        drop(sender);

        worker.run().await;

        assert_eq!(backend.inner.len(), 2);
        assert_eq!(stats.events_failed.load(Ordering::SeqCst), 1);
        assert_eq!(stats.events_delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_drain_deadline_abandons_queued_events() {
        let backend = Arc::new(InMemoryBackend::new());
        let (worker, sender, stats, shutdown) = worker_for(backend.clone(), 8);

        sender.try_send(DeliveryCommand::Deliver(event("/api/a"))).unwrap();
        sender.try_send(DeliveryCommand::Deliver(event("/api/b"))).unwrap();
        sender.try_send(DeliveryCommand::Shutdown).unwrap();
        assert!(shutdown.request(Duration::ZERO));
        assert!(!shutdown.request(Duration::ZERO));

        let result = worker.run().await;
        assert_eq!(result.events_abandoned, 2);
        assert_eq!(result.events_drained, 0);
        assert!(backend.is_empty());
        assert_eq!(stats.events_abandoned.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = AtomicStats::default();
        stats.events_accepted.store(10, Ordering::SeqCst);
        stats.events_delivered.store(7, Ordering::SeqCst);
        stats.events_dropped.store(2, Ordering::SeqCst);

        let snapshot = stats.snapshot(1, 16);
        assert_eq!(snapshot.events_accepted, 10);
        assert_eq!(snapshot.events_delivered, 7);
        assert_eq!(snapshot.events_dropped, 2);
        assert_eq!(snapshot.channel_depth, 1);
        assert_eq!(snapshot.channel_capacity, 16);
        assert!(snapshot.last_delivered_at.is_none());
    }
}
