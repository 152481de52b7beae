//! # Registration Events
//!
//! The event type and the publisher pipeline that carries it to a registry
//! backend.
//!
//! ```text
//! lifecycle hooks ──publish──> RegistrationPublisher ──channel──> DeliveryWorker ──> RegistryBackend
//! ```

pub mod publisher;
pub mod registration;
mod worker;

pub use publisher::{PublishOutcome, RegistrationPublisher, StartOutcome, DELIVERY_THREAD_NAME};
pub use registration::{RegistrationEvent, RegistrationEventBuilder};
pub use worker::{PublisherStats, ShutdownResult};
