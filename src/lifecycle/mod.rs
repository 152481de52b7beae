//! # Lifecycle Hooks
//!
//! Entry points the hosting framework calls while the application starts.
//!
//! - [`ContextRegisterListener`]: context refreshed, at most one full-context registration
//! - [`EndpointScanProcessor`]: component initialized, per-endpoint registrations
//!
//! Both validate configuration at construction and start the shared
//! [`RegistrationPublisher`](crate::events::RegistrationPublisher) with the
//! configured backend. Whichever is built first wins the start.

pub mod context_listener;
pub mod endpoint_processor;
pub mod guard;

pub use context_listener::ContextRegisterListener;
pub use endpoint_processor::{ControllerDescriptor, ControllerMarker, EndpointScanProcessor, HandlerMethod};
pub use guard::{RegistrationGuard, RegistrationState};
