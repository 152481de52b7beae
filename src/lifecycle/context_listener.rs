//! # Context Register Listener
//!
//! Reacts to the host framework's "context refreshed" signal.
//!
//! The signal can fire several times (parent and child contexts, refreshes),
//! but the instance is registered at most once. In full mode that single
//! registration is one event covering `context_path + "/**"`, announced with
//! the instance's host and port. Otherwise the listener only starts the
//! publisher and leaves per-endpoint registration to the
//! [`EndpointScanProcessor`](super::EndpointScanProcessor).

use super::guard::RegistrationGuard;
use crate::config::{ListenerSettings, RegisterCenterConfig};
use crate::error::Result;
use crate::events::{PublishOutcome, RegistrationPublisher};
use crate::logging::{log_error, log_registration_operation};
use crate::metadata::{build_full_event, resolve_host, HostResolver};
use crate::registry::RegistryBackend;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ContextRegisterListener {
    settings: ListenerSettings,
    publisher: Arc<RegistrationPublisher>,
    host_resolver: Arc<dyn HostResolver>,
    guard: RegistrationGuard,
}

impl ContextRegisterListener {
    /// Validate configuration and start the shared publisher
    ///
    /// Fails fast when `contextPath`, `appName`, `registerType`,
    /// `serverLists` or a positive `port` is missing.
    pub fn new(
        config: &RegisterCenterConfig,
        publisher: Arc<RegistrationPublisher>,
        backend: Arc<dyn RegistryBackend>,
        host_resolver: Arc<dyn HostResolver>,
    ) -> Result<Self> {
        let settings = config.listener_settings().map_err(|e| {
            log_error(
                "context_register_listener",
                "validate_config",
                &e.to_string(),
                Some(&config.register_type),
            );
            e
        })?;

        let outcome = publisher.start(backend)?;
        debug!(
            app_name = %settings.identity.app_name(),
            start_outcome = ?outcome,
            is_full = settings.is_full,
            "Context register listener ready"
        );

        Ok(Self {
            settings,
            publisher,
            host_resolver,
            guard: RegistrationGuard::new(),
        })
    }

    pub fn settings(&self) -> &ListenerSettings {
        &self.settings
    }

    pub fn is_registered(&self) -> bool {
        self.guard.is_registered()
    }

    /// Handle one context refreshed signal
    ///
    /// Returns true only for the call that announced the full-context event.
    pub fn on_context_refreshed(&self) -> bool {
        if !self.guard.try_register() {
            debug!(
                app_name = %self.settings.identity.app_name(),
                "Context already registered, ignoring refresh"
            );
            return false;
        }

        if !self.settings.is_full {
            return false;
        }

        let host = resolve_host(self.settings.host.as_deref(), self.host_resolver.as_ref());
        let event = build_full_event(&self.settings.identity, host, self.settings.port);

        match self.publisher.publish(event.clone()) {
            PublishOutcome::Accepted => {
                let details = format!(
                    "{}:{}",
                    event.host().unwrap_or_default(),
                    event.port().unwrap_or_default()
                );
                log_registration_operation(
                    "full_context_registration",
                    event.app_name(),
                    Some(event.path()),
                    "accepted",
                    Some(&details),
                );
            }
            outcome => {
                warn!(
                    app_name = %event.app_name(),
                    path = %event.path(),
                    outcome = ?outcome,
                    "Full context registration not queued"
                );
            }
        }
        true
    }
}
