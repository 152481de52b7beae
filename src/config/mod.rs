//! # Registrar Configuration
//!
//! Settings consumed by the registration pipeline:
//!
//! - [`RegisterCenterConfig`] selects the registry backend (`register_type`,
//!   `server_lists`) and carries free-form client properties
//!   (`contextPath`, `appName`, `port`, `host`, `isFull`).
//! - [`PublisherConfig`] sizes the pending-event channel and sets the
//!   saturation, delivery and shutdown policies.
//! - [`RegistrarConfig`] is the root document loaded by [`ConfigLoader`].
//!
//! Validation happens when a lifecycle entry point is constructed. Missing
//! fields are collected and reported together.
//!
//! ## Usage
//!
//! ```rust
//! use registrar_client::config::RegisterCenterConfig;
//!
//! let config = RegisterCenterConfig::new("memory", "localhost:9095")
//!     .with_prop("contextPath", "/orders")
//!     .with_prop("appName", "orders")
//!     .with_prop("port", "8080");
//!
//! let settings = config.listener_settings().unwrap();
//! assert_eq!(settings.port, 8080);
//! assert!(!settings.is_full);
//! ```

pub mod error;
pub mod loader;

use crate::constants::props;
use crate::metadata::ServiceIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Registry center selection plus client properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCenterConfig {
    /// Backend selector, e.g. `memory`, `log`, or any registered type
    #[serde(default)]
    pub register_type: String,
    /// Backend endpoint(s), format defined by the backend
    #[serde(default)]
    pub server_lists: String,
    /// Client properties keyed by their camelCase names
    #[serde(default)]
    pub props: HashMap<String, String>,
}

/// Validated settings for the context register listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    pub identity: ServiceIdentity,
    /// Explicitly configured host, `None` means resolve locally
    pub host: Option<String>,
    pub port: u16,
    pub is_full: bool,
}

/// Validated settings for the endpoint scan processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSettings {
    pub identity: ServiceIdentity,
    pub is_full: bool,
}

impl RegisterCenterConfig {
    pub fn new(register_type: impl Into<String>, server_lists: impl Into<String>) -> Self {
        Self {
            register_type: register_type.into(),
            server_lists: server_lists.into(),
            props: HashMap::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Non-blank property value.
    ///
    /// Keys match case-insensitively since environment overrides arrive
    /// lowercased.
    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props
            .get(key)
            .or_else(|| {
                self.props
                    .iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
            .filter(|value| !is_blank(value))
    }

    /// `isFull` follows lenient boolean parsing: only `true` (any case) enables it
    pub fn is_full(&self) -> bool {
        self.prop(props::IS_FULL)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }

    /// Validate settings for the context register listener.
    ///
    /// Requires `contextPath`, `appName`, `registerType`, `serverLists` and a
    /// positive `port`.
    pub fn listener_settings(&self) -> ConfigResult<ListenerSettings> {
        const CONTEXT: &str = "context register listener";

        let mut missing = self.missing_common_fields();
        let app_name = self.prop(props::APP_NAME);
        if app_name.is_none() {
            missing.push(props::APP_NAME.to_string());
        }
        let raw_port = self.prop(props::PORT);
        if raw_port.is_none() {
            missing.push(props::PORT.to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigurationError::missing_fields(missing, CONTEXT));
        }

        let port = parse_port(raw_port.unwrap_or_default(), CONTEXT)?;
        let identity = ServiceIdentity::new(
            self.prop(props::CONTEXT_PATH).unwrap_or_default(),
            app_name.unwrap_or_default(),
        )?;

        Ok(ListenerSettings {
            identity,
            host: self.prop(props::HOST).map(str::to_string),
            port,
            is_full: self.is_full(),
        })
    }

    /// Validate settings for the endpoint scan processor.
    ///
    /// The application name comes from the hosting framework rather than the
    /// client properties, and no port is required.
    pub fn processor_settings(&self, application_name: Option<&str>) -> ConfigResult<ProcessorSettings> {
        const CONTEXT: &str = "endpoint scan processor";

        let mut missing = self.missing_common_fields();
        let app_name = application_name.filter(|name| !is_blank(name));
        if app_name.is_none() {
            missing.push("applicationName".to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigurationError::missing_fields(missing, CONTEXT));
        }

        let identity = ServiceIdentity::new(
            self.prop(props::CONTEXT_PATH).unwrap_or_default(),
            app_name.unwrap_or_default(),
        )?;

        Ok(ProcessorSettings {
            identity,
            is_full: self.is_full(),
        })
    }

    fn missing_common_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.prop(props::CONTEXT_PATH).is_none() {
            missing.push(props::CONTEXT_PATH.to_string());
        }
        if is_blank(&self.register_type) {
            missing.push("registerType".to_string());
        }
        if is_blank(&self.server_lists) {
            missing.push("serverLists".to_string());
        }
        missing
    }
}

fn parse_port(raw: &str, context: &str) -> ConfigResult<u16> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        ConfigurationError::invalid_value(props::PORT, raw, format!("{context}: port must be an integer"))
    })?;
    if value <= 0 {
        return Err(ConfigurationError::invalid_value(
            props::PORT,
            raw,
            format!("{context}: port must be > 0"),
        ));
    }
    u16::try_from(value).map_err(|_| {
        ConfigurationError::invalid_value(props::PORT, raw, format!("{context}: port must be <= 65535"))
    })
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Behaviour when the pending-event channel is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Retry for up to `send_timeout`, then drop the event and count it
    #[default]
    BlockWithTimeout,
    /// Drop the incoming event immediately and count it
    DropNewest,
}

/// Publisher channel and worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Capacity of the pending-event channel
    pub channel_buffer_size: usize,
    /// Saturation policy
    pub overflow_policy: OverflowPolicy,
    /// Bounded wait for `block_with_timeout`
    pub send_timeout_ms: u64,
    /// Upper bound on a single backend `persist` call
    pub delivery_timeout_ms: u64,
    /// Budget for draining queued events on shutdown
    pub shutdown_drain_timeout_ms: u64,
    /// Log every dropped event at warn level
    pub log_dropped_events: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1024,
            overflow_policy: OverflowPolicy::BlockWithTimeout,
            send_timeout_ms: 500,
            delivery_timeout_ms: 30_000,
            shutdown_drain_timeout_ms: 5_000,
            log_dropped_events: true,
        }
    }
}

impl PublisherConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn shutdown_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_drain_timeout_ms)
    }

    /// Reject settings the channel cannot honor
    pub fn validate(&self) -> ConfigResult<()> {
        if self.channel_buffer_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "channel_buffer_size",
                "0",
                "pending-event channel must hold at least one event",
            ));
        }
        if self.delivery_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "delivery_timeout_ms",
                "0",
                "delivery timeout must be positive",
            ));
        }
        Ok(())
    }
}

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarConfig {
    #[serde(default)]
    pub register: RegisterCenterConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Name of the hosting application, used by the endpoint scan processor
    #[serde(default)]
    pub application_name: Option<String>,
}

impl RegistrarConfig {
    /// The context register listener runs in full mode, or whenever a
    /// `port` is configured for it
    pub fn wants_context_listener(&self) -> bool {
        self.register.is_full() || self.register.prop(props::PORT).is_some()
    }

    /// Application name for the endpoint scan processor, falling back to the
    /// `appName` prop
    pub fn endpoint_app_name(&self) -> Option<&str> {
        self.application_name
            .as_deref()
            .filter(|name| !is_blank(name))
            .or_else(|| self.register.prop(props::APP_NAME))
    }

    /// Per-endpoint mode always needs the processor; full mode only when an
    /// application name is known
    pub fn wants_endpoint_processor(&self) -> bool {
        !self.register.is_full() || self.endpoint_app_name().is_some()
    }
}
