//! # Registrar Client Bootstrap
//!
//! Wires one registrar client per process: backend, shared publisher and the
//! lifecycle hooks the configuration asks for.
//!
//! ## Key Features
//!
//! - **Config-driven hooks**: the context listener is built in full mode or when a
//!   `port` is set; the endpoint processor in per-endpoint mode or when an
//!   application name is known
//! - **Single publisher**: listener and processor share one `Arc<RegistrationPublisher>`
//! - **Fail fast**: invalid configuration surfaces as an error before anything starts
//! - **Lifecycle management**: `shutdown` drains pending registrations, `status` reports progress
//!
//! ## Usage
//!
//! ```rust
//! use registrar_client::bootstrap::RegistrarClient;
//! use registrar_client::config::{RegisterCenterConfig, RegistrarConfig};
//! use registrar_client::registry::BackendFactory;
//!
//! let config = RegistrarConfig {
//!     register: RegisterCenterConfig::new("memory", "local")
//!         .with_prop("contextPath", "/orders")
//!         .with_prop("appName", "orders")
//!         .with_prop("port", "8080"),
//!     application_name: Some("orders".to_string()),
//!     ..Default::default()
//! };
//!
//! let client = RegistrarClient::bootstrap(config, &BackendFactory::with_defaults()).unwrap();
//! let listener = client.context_listener().expect("port configured");
//! listener.on_context_refreshed();
//! assert!(client.status().running);
//! client.shutdown();
//! ```

use crate::config::RegistrarConfig;
use crate::error::Result;
use crate::events::{PublisherStats, RegistrationPublisher, ShutdownResult};
use crate::lifecycle::{ContextRegisterListener, EndpointScanProcessor};
use crate::metadata::{HostResolver, LocalHostResolver};
use crate::registry::BackendFactory;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Client status information
#[derive(Debug, Clone, Serialize)]
pub struct ClientStatus {
    pub running: bool,
    pub register_type: String,
    pub backend: Option<String>,
    pub app_name: String,
    pub context_path: String,
    pub full_mode: bool,
    pub context_registered: bool,
    pub publisher: PublisherStats,
}

/// Handle owning the wired registrar client
#[derive(Debug)]
pub struct RegistrarClient {
    config: RegistrarConfig,
    publisher: Arc<RegistrationPublisher>,
    context_listener: Option<ContextRegisterListener>,
    endpoint_processor: Option<EndpointScanProcessor>,
}

impl RegistrarClient {
    /// Bootstrap with the local interface host resolver
    pub fn bootstrap(config: RegistrarConfig, factory: &BackendFactory) -> Result<Self> {
        Self::bootstrap_with_host_resolver(config, factory, Arc::new(LocalHostResolver))
    }

    pub fn bootstrap_with_host_resolver(
        config: RegistrarConfig,
        factory: &BackendFactory,
        host_resolver: Arc<dyn HostResolver>,
    ) -> Result<Self> {
        info!(
            register_type = %config.register.register_type,
            server_lists = %config.register.server_lists,
            "Bootstrapping registrar client"
        );

        config.publisher.validate()?;
        let backend = factory.create(&config.register)?;
        let publisher = Arc::new(RegistrationPublisher::new(config.publisher.clone()));

        let context_listener = if config.wants_context_listener() {
            Some(ContextRegisterListener::new(
                &config.register,
                Arc::clone(&publisher),
                Arc::clone(&backend),
                host_resolver,
            )?)
        } else {
            None
        };
        let endpoint_processor = if config.wants_endpoint_processor() {
            Some(EndpointScanProcessor::new(
                &config.register,
                config.endpoint_app_name(),
                Arc::clone(&publisher),
                backend,
            )?)
        } else {
            None
        };

        info!(
            publisher_id = %publisher.publisher_id(),
            backend = %publisher.backend_name().unwrap_or_default(),
            full_mode = config.register.is_full(),
            context_listener = context_listener.is_some(),
            endpoint_processor = endpoint_processor.is_some(),
            "Registrar client bootstrapped"
        );

        Ok(Self {
            config,
            publisher,
            context_listener,
            endpoint_processor,
        })
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    pub fn publisher(&self) -> Arc<RegistrationPublisher> {
        Arc::clone(&self.publisher)
    }

    /// `None` when the configuration does not ask for full-context registration
    pub fn context_listener(&self) -> Option<&ContextRegisterListener> {
        self.context_listener.as_ref()
    }

    /// `None` in full mode without an application name
    pub fn endpoint_processor(&self) -> Option<&EndpointScanProcessor> {
        self.endpoint_processor.as_ref()
    }

    /// Drain pending registrations and stop the delivery worker
    pub fn shutdown(&self) -> ShutdownResult {
        let result = self.publisher.shutdown();
        if !result.success {
            warn!(
                events_abandoned = result.events_abandoned,
                "Registrar client shutdown incomplete"
            );
        }
        result
    }

    pub fn status(&self) -> ClientStatus {
        let identity = match (&self.context_listener, &self.endpoint_processor) {
            (Some(listener), _) => Some(&listener.settings().identity),
            (None, Some(processor)) => Some(&processor.settings().identity),
            (None, None) => None,
        };
        ClientStatus {
            running: self.publisher.is_running(),
            register_type: self.config.register.register_type.clone(),
            backend: self.publisher.backend_name(),
            app_name: identity
                .map(|identity| identity.app_name().to_string())
                .unwrap_or_default(),
            context_path: identity
                .map(|identity| identity.context_path().to_string())
                .unwrap_or_default(),
            full_mode: self.config.register.is_full(),
            context_registered: self
                .context_listener
                .as_ref()
                .is_some_and(ContextRegisterListener::is_registered),
            publisher: self.publisher.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationError, RegisterCenterConfig};
    use crate::error::RegistrarError;
    use crate::metadata::StaticHostResolver;

    fn config(register_type: &str) -> RegistrarConfig {
        RegistrarConfig {
            register: RegisterCenterConfig::new(register_type, "local")
                .with_prop("contextPath", "/orders")
                .with_prop("appName", "orders")
                .with_prop("port", "8080")
                .with_prop("isFull", "true"),
            application_name: Some("orders".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_bootstrap_shares_one_publisher() {
        let client = RegistrarClient::bootstrap_with_host_resolver(
            config("memory"),
            &BackendFactory::with_defaults(),
            Arc::new(StaticHostResolver("10.0.0.5".to_string())),
        )
        .unwrap();

        assert!(client.context_listener().unwrap().on_context_refreshed());
        assert_eq!(
            client
                .endpoint_processor()
                .unwrap()
                .settings()
                .identity
                .app_name(),
            "orders"
        );
        let status = client.status();
        assert!(status.running);
        assert!(status.full_mode);
        assert!(status.context_registered);
        assert_eq!(status.backend.as_deref(), Some("memory"));

        let result = client.shutdown();
        assert!(result.success);
        assert_eq!(client.publisher().stats().events_delivered, 1);
        assert!(!client.status().running);
    }

    #[test]
    fn test_per_endpoint_bootstrap_skips_context_listener() {
        let config = RegistrarConfig {
            register: RegisterCenterConfig::new("memory", "registry:9095")
                .with_prop("contextPath", "/api"),
            application_name: Some("users".to_string()),
            ..Default::default()
        };
        let client = RegistrarClient::bootstrap(config, &BackendFactory::with_defaults()).unwrap();

        assert!(client.context_listener().is_none());
        assert!(client.endpoint_processor().is_some());
        let status = client.status();
        assert!(status.running);
        assert!(!status.full_mode);
        assert!(!status.context_registered);
        assert_eq!(status.app_name, "users");
        assert_eq!(status.context_path, "/api");
        assert!(client.shutdown().success);
    }

    #[test]
    fn test_full_mode_falls_back_to_app_name_prop() {
        let config = RegistrarConfig {
            register: RegisterCenterConfig::new("memory", "local")
                .with_prop("contextPath", "/orders")
                .with_prop("appName", "orders")
                .with_prop("port", "8080")
                .with_prop("isFull", "true"),
            application_name: None,
            ..Default::default()
        };
        let client = RegistrarClient::bootstrap_with_host_resolver(
            config,
            &BackendFactory::with_defaults(),
            Arc::new(StaticHostResolver("10.0.0.5".to_string())),
        )
        .unwrap();

        // appName prop stands in for the application name
        assert!(client.endpoint_processor().is_some());
        assert!(client.context_listener().unwrap().on_context_refreshed());
        client.shutdown();
    }

    #[test]
    fn test_per_endpoint_bootstrap_requires_application_name() {
        let config = RegistrarConfig {
            register: RegisterCenterConfig::new("memory", "registry:9095")
                .with_prop("contextPath", "/api"),
            application_name: None,
            ..Default::default()
        };
        let err = RegistrarClient::bootstrap(config, &BackendFactory::with_defaults()).unwrap_err();
        match err {
            RegistrarError::Configuration(ConfigurationError::MissingRequiredFields { fields, .. }) => {
                assert_eq!(fields, vec!["applicationName"]);
            }
            other => panic!("expected missing applicationName, got {other:?}"),
        }
    }

    #[test]
    fn test_bootstrap_rejects_unknown_register_type() {
        let err = RegistrarClient::bootstrap(config("etcd"), &BackendFactory::with_defaults())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Configuration(ConfigurationError::UnknownRegisterType { .. })
        ));
    }
}
