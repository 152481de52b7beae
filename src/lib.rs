#![allow(clippy::doc_markdown)] // Allow technical terms like camelCase property names in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Registrar Client
//!
//! Client-side endpoint registration for services that sit behind a gateway.
//!
//! ## Overview
//!
//! While an application starts, its web framework discovers request-handling
//! controllers. This crate turns those discoveries into registration events
//! and delivers them to a pluggable registry backend, without ever slowing
//! down startup: publishing is a non-blocking hand-off to a bounded channel
//! drained by a single background worker.
//!
//! ## Key Features
//!
//! - **Per-endpoint registration**: one event per annotated handler method
//! - **Full-context registration**: one `context_path + "/**"` event per instance, at most once
//! - **Bounded, ordered delivery**: FIFO across producers, explicit overflow policy
//! - **Failure isolation**: backend errors, timeouts and panics never reach business code
//!
//! ## Module Organization
//!
//! - [`bootstrap`] - One-call wiring of backend, publisher and lifecycle hooks
//! - [`config`] - Register center, publisher and file/env configuration
//! - [`events`] - Registration events and the publisher pipeline
//! - [`lifecycle`] - Context listener and endpoint scan processor
//! - [`metadata`] - Path composition and event builders
//! - [`registry`] - Backend trait, built-in backends and backend factory
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use registrar_client::bootstrap::RegistrarClient;
//! use registrar_client::config::{RegisterCenterConfig, RegistrarConfig};
//! use registrar_client::lifecycle::{ControllerDescriptor, ControllerMarker, HandlerMethod};
//! use registrar_client::metadata::EndpointAnnotation;
//! use registrar_client::registry::BackendFactory;
//!
//! let config = RegistrarConfig {
//!     register: RegisterCenterConfig::new("log", "stdout")
//!         .with_prop("contextPath", "/api")
//!         .with_prop("appName", "users")
//!         .with_prop("port", "8080"),
//!     application_name: Some("users".to_string()),
//!     ..Default::default()
//! };
//! let client = RegistrarClient::bootstrap(config, &BackendFactory::with_defaults()).unwrap();
//!
//! let controller = ControllerDescriptor::new("UserController")
//!     .with_marker(ControllerMarker::RestController)
//!     .with_class_annotation(EndpointAnnotation::new("/user"))
//!     .with_method(HandlerMethod::annotated("info", EndpointAnnotation::new("/info")));
//! let processor = client.endpoint_processor().expect("per-endpoint mode");
//! assert_eq!(processor.on_component_initialized(&controller), 1);
//!
//! client.shutdown();
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod metadata;
pub mod registry;

pub use bootstrap::{ClientStatus, RegistrarClient};
pub use config::{ConfigurationError, PublisherConfig, RegisterCenterConfig, RegistrarConfig};
pub use error::{RegistrarError, Result};
pub use events::{PublishOutcome, RegistrationEvent, RegistrationPublisher, StartOutcome};
pub use registry::{BackendError, BackendFactory, RegistryBackend};
