//! # Registration Publisher
//!
//! Asynchronous, bounded hand-off between code that discovers endpoints and
//! the registry backend that announces them.
//!
//! ## Overview
//!
//! `publish` never waits on the backend. It places the event on a bounded
//! channel with `try_send` and returns a [`PublishOutcome`]. A dedicated
//! `registration-delivery` thread drains the channel in FIFO order and calls
//! the backend once per event.
//!
//! ## Key Features
//!
//! - **Idempotent start**: concurrent `start` calls create exactly one worker
//! - **Bounded memory**: saturation is resolved by the configured
//!   [`OverflowPolicy`], and every drop is counted
//! - **Failure isolation**: backend errors, timeouts and panics are logged and
//!   counted per event, the worker keeps going
//! - **Graceful shutdown**: queued events are drained until the drain
//!   deadline, then the backend is closed and the worker joined
//!
//! ## Usage
//!
//! ```rust
//! use registrar_client::config::PublisherConfig;
//! use registrar_client::events::{PublishOutcome, RegistrationEvent, RegistrationPublisher, StartOutcome};
//! use registrar_client::registry::InMemoryBackend;
//! use std::sync::Arc;
//!
//! let publisher = RegistrationPublisher::new(PublisherConfig::default());
//! let backend = Arc::new(InMemoryBackend::new());
//! assert_eq!(publisher.start(backend.clone()).unwrap(), StartOutcome::Started);
//!
//! let event = RegistrationEvent::builder()
//!     .context_path("/orders")
//!     .app_name("orders")
//!     .path("/orders/list")
//!     .build()
//!     .unwrap();
//! assert_eq!(publisher.publish(event), PublishOutcome::Accepted);
//!
//! let result = publisher.shutdown();
//! assert!(result.success);
//! assert_eq!(backend.len(), 1);
//! ```

use super::worker::{AtomicStats, DeliveryCommand, DeliveryWorker, ShutdownSignal};
use super::{PublisherStats, RegistrationEvent, ShutdownResult};
use crate::config::{OverflowPolicy, PublisherConfig};
use crate::error::{RegistrarError, Result};
use crate::registry::RegistryBackend;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pause between `try_send` attempts while the channel is saturated
const SATURATION_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Name of the delivery thread
pub const DELIVERY_THREAD_NAME: &str = "registration-delivery";

/// Result of [`RegistrationPublisher::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    /// This call created the worker
    Started,
    /// A worker already existed; the supplied backend was ignored
    AlreadyStarted,
}

/// Result of [`RegistrationPublisher::publish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Queued for delivery
    Accepted,
    /// Rejected because the channel stayed saturated
    Dropped,
    /// `start` has not been called yet
    NotStarted,
    /// The publisher is shutting down or has shut down
    Closed,
}

impl PublishOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PublishOutcome::Accepted)
    }
}

/// Everything created by a successful `start`
struct PublisherState {
    sender: mpsc::Sender<DeliveryCommand>,
    backend_name: String,
    stats: Arc<AtomicStats>,
    shutdown: Arc<ShutdownSignal>,
    is_running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<ShutdownResult>>>,
    /// Set when shutdown gave up on the worker without joining it
    detached: AtomicBool,
}

/// Process-wide registration publisher
///
/// Share it as `Arc<RegistrationPublisher>` between the lifecycle hooks that
/// produce events. All methods take `&self`.
pub struct RegistrationPublisher {
    publisher_id: String,
    config: PublisherConfig,
    state: OnceLock<PublisherState>,
    init_lock: Mutex<()>,
}

impl fmt::Debug for RegistrationPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationPublisher")
            .field("publisher_id", &self.publisher_id)
            .field("config", &self.config)
            .field("started", &self.is_started())
            .field("running", &self.is_running())
            .finish()
    }
}

impl RegistrationPublisher {
    pub fn new(config: PublisherConfig) -> Self {
        let publisher_id = format!("pub_{}", &Uuid::new_v4().to_string()[..8]);
        debug!(
            publisher_id = %publisher_id,
            channel_buffer_size = config.channel_buffer_size,
            overflow_policy = ?config.overflow_policy,
            "Creating RegistrationPublisher"
        );
        Self {
            publisher_id,
            config,
            state: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Bind the backend and spawn the delivery worker
    ///
    /// Only the first successful call has any effect. Later calls return
    /// [`StartOutcome::AlreadyStarted`] and drop the backend they were given.
    pub fn start(&self, backend: Arc<dyn RegistryBackend>) -> Result<StartOutcome> {
        if self.state.get().is_some() {
            debug!(publisher_id = %self.publisher_id, "Publisher already started");
            return Ok(StartOutcome::AlreadyStarted);
        }

        let _guard = self.init_lock.lock();
        if self.state.get().is_some() {
            debug!(publisher_id = %self.publisher_id, "Publisher already started");
            return Ok(StartOutcome::AlreadyStarted);
        }

        let state = self.spawn_worker(backend)?;
        info!(
            publisher_id = %self.publisher_id,
            backend = %state.backend_name,
            channel_buffer_size = self.config.channel_buffer_size,
            "Registration publisher started"
        );
        self.state.get_or_init(|| state);
        Ok(StartOutcome::Started)
    }

    fn spawn_worker(&self, backend: Arc<dyn RegistryBackend>) -> Result<PublisherState> {
        self.config.validate()?;
        let (sender, receiver) = mpsc::channel(self.config.channel_buffer_size);
        let stats = Arc::new(AtomicStats::default());
        let shutdown = Arc::new(ShutdownSignal::default());
        let is_running = Arc::new(AtomicBool::new(true));
        let backend_name = backend.backend_name().to_string();

        let worker = DeliveryWorker::new(
            receiver,
            backend,
            Arc::clone(&stats),
            Arc::clone(&shutdown),
            Arc::clone(&is_running),
            self.config.clone(),
            self.publisher_id.clone(),
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RegistrarError::WorkerSpawn(format!("failed to build runtime: {e}")))?;

        let handle = std::thread::Builder::new()
            .name(DELIVERY_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(worker.run()))
            .map_err(|e| RegistrarError::WorkerSpawn(e.to_string()))?;

        Ok(PublisherState {
            sender,
            backend_name,
            stats,
            shutdown,
            is_running,
            worker: Mutex::new(Some(handle)),
            detached: AtomicBool::new(false),
        })
    }

    /// Queue an event for delivery without waiting for the backend
    ///
    /// Under [`OverflowPolicy::BlockWithTimeout`] a saturated channel is
    /// retried for at most `send_timeout_ms` before the event is dropped.
    pub fn publish(&self, event: RegistrationEvent) -> PublishOutcome {
        let Some(state) = self.state.get() else {
            warn!(
                publisher_id = %self.publisher_id,
                path = %event.path(),
                "Publish called before start, event discarded"
            );
            return PublishOutcome::NotStarted;
        };

        if state.shutdown.is_requested() {
            debug!(path = %event.path(), "Publisher closed, event discarded");
            return PublishOutcome::Closed;
        }

        let deadline = match self.config.overflow_policy {
            OverflowPolicy::BlockWithTimeout => Some(Instant::now() + self.config.send_timeout()),
            OverflowPolicy::DropNewest => None,
        };

        // Counted before the send so a snapshot never shows more deliveries
        // than acceptances; rolled back if the event does not make it in
        state.stats.events_accepted.fetch_add(1, Ordering::SeqCst);
        let mut command = DeliveryCommand::Deliver(event);
        loop {
            match state.sender.try_send(command) {
                Ok(()) => return PublishOutcome::Accepted,
                Err(mpsc::error::TrySendError::Full(returned)) => {
                    let remaining = deadline
                        .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                        .unwrap_or_default();
                    if remaining.is_zero() {
                        state.stats.events_accepted.fetch_sub(1, Ordering::SeqCst);
                        state.stats.events_dropped.fetch_add(1, Ordering::SeqCst);
                        if self.config.log_dropped_events {
                            if let DeliveryCommand::Deliver(event) = &returned {
                                warn!(
                                    publisher_id = %self.publisher_id,
                                    app_name = %event.app_name(),
                                    path = %event.path(),
                                    channel_capacity = self.config.channel_buffer_size,
                                    "Registration channel saturated, event dropped"
                                );
                            }
                        }
                        return PublishOutcome::Dropped;
                    }
                    command = returned;
                    std::thread::sleep(remaining.min(SATURATION_RETRY_INTERVAL));
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    state.stats.events_accepted.fetch_sub(1, Ordering::SeqCst);
                    error!(
                        publisher_id = %self.publisher_id,
                        "Registration channel closed, event discarded"
                    );
                    return PublishOutcome::Closed;
                }
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.get().is_some()
    }

    /// True while the delivery worker is alive
    pub fn is_running(&self) -> bool {
        self.state
            .get()
            .is_some_and(|state| state.is_running.load(Ordering::SeqCst))
    }

    pub fn backend_name(&self) -> Option<String> {
        self.state.get().map(|state| state.backend_name.clone())
    }

    /// Counter snapshot; all zero before `start`
    pub fn stats(&self) -> PublisherStats {
        match self.state.get() {
            Some(state) => {
                let capacity = state.sender.max_capacity();
                let depth = capacity.saturating_sub(state.sender.capacity());
                state.stats.snapshot(depth, capacity)
            }
            None => PublisherStats {
                channel_capacity: self.config.channel_buffer_size,
                ..PublisherStats::default()
            },
        }
    }

    /// Stop accepting events, drain the queue and join the worker
    ///
    /// Safe to call more than once; only the first call does any work.
    pub fn shutdown(&self) -> ShutdownResult {
        let started = Instant::now();
        let Some(state) = self.state.get() else {
            debug!(publisher_id = %self.publisher_id, "Shutdown before start, nothing to do");
            return ShutdownResult {
                success: true,
                ..ShutdownResult::default()
            };
        };

        let Some(handle) = state.worker.lock().take() else {
            let detached = state.detached.load(Ordering::SeqCst);
            debug!(
                publisher_id = %self.publisher_id,
                detached = detached,
                "Publisher already shut down"
            );
            return ShutdownResult {
                success: !detached,
                ..ShutdownResult::default()
            };
        };

        let drain_timeout = self.config.shutdown_drain_timeout();
        state.shutdown.request(drain_timeout);
        info!(
            publisher_id = %self.publisher_id,
            queued = state.sender.max_capacity().saturating_sub(state.sender.capacity()),
            drain_timeout_ms = self.config.shutdown_drain_timeout_ms,
            "Shutting down registration publisher"
        );

        if !self.send_shutdown_marker(state, started + drain_timeout + self.config.delivery_timeout()) {
            // The worker is wedged on a full queue; leave it detached
            state.detached.store(true, Ordering::SeqCst);
            warn!(
                publisher_id = %self.publisher_id,
                "Could not enqueue shutdown marker, delivery worker left detached"
            );
            return ShutdownResult {
                success: false,
                duration_ms: started.elapsed().as_millis() as u64,
                ..ShutdownResult::default()
            };
        }

        let mut result = match handle.join() {
            Ok(result) => result,
            Err(_) => {
                error!(publisher_id = %self.publisher_id, "Delivery worker panicked");
                ShutdownResult::default()
            }
        };
        result.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            publisher_id = %self.publisher_id,
            success = result.success,
            events_drained = result.events_drained,
            events_abandoned = result.events_abandoned,
            duration_ms = result.duration_ms,
            "Registration publisher shut down"
        );
        result
    }

    fn send_shutdown_marker(&self, state: &PublisherState, deadline: Instant) -> bool {
        loop {
            match state.sender.try_send(DeliveryCommand::Shutdown) {
                Ok(()) => return true,
                // Worker already gone, join returns immediately
                Err(mpsc::error::TrySendError::Closed(_)) => return true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if Instant::now() >= deadline {
                        return false;
                    }
                    std::thread::sleep(SATURATION_RETRY_INTERVAL);
                }
            }
        }
    }
}

impl Drop for RegistrationPublisher {
    fn drop(&mut self) {
        if self.is_running() {
            let result = self.shutdown();
            debug!(
                publisher_id = %self.publisher_id,
                success = result.success,
                "Publisher shut down on drop"
            );
        }
    }
}
