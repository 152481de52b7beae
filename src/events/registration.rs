//! # Registration Event
//!
//! Immutable description of one externally reachable endpoint, or of a whole
//! service instance, as handed to a [`RegistryBackend`](crate::registry::RegistryBackend).
//!
//! Fields are private and there are no setters. Every construction path,
//! including deserialization, goes through [`RegistrationEventBuilder::build`]
//! or the metadata builder, so `context_path`, `app_name`, `path` and
//! `rule_name` are never empty.

use crate::config::is_blank;
use crate::constants::RpcType;
use crate::error::{RegistrarError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata for one registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RegistrationEventBuilder")]
pub struct RegistrationEvent {
    context_path: String,
    app_name: String,
    path: String,
    path_desc: String,
    rpc_type: RpcType,
    enabled: bool,
    rule_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

impl RegistrationEvent {
    pub fn builder() -> RegistrationEventBuilder {
        RegistrationEventBuilder::default()
    }

    /// Used by the metadata builder, whose inputs are already validated
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        context_path: String,
        app_name: String,
        path: String,
        path_desc: String,
        rpc_type: RpcType,
        enabled: bool,
        rule_name: String,
        host: Option<String>,
        port: Option<u16>,
    ) -> Self {
        debug_assert!(!context_path.is_empty() && !app_name.is_empty() && !path.is_empty());
        Self {
            context_path,
            app_name,
            path,
            path_desc,
            rpc_type,
            enabled,
            rule_name,
            host,
            port,
        }
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_desc(&self) -> &str {
        &self.path_desc
    }

    pub fn rpc_type(&self) -> RpcType {
        self.rpc_type
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether this event describes the whole instance rather than one endpoint
    pub fn is_full_context(&self) -> bool {
        self.host.is_some()
    }
}

impl fmt::Display for RegistrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}]", self.app_name, self.path, self.rpc_type)
    }
}

/// Builder for [`RegistrationEvent`], also its wire representation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationEventBuilder {
    context_path: String,
    app_name: String,
    path: String,
    path_desc: String,
    rpc_type: Option<RpcType>,
    enabled: Option<bool>,
    rule_name: String,
    host: Option<String>,
    port: Option<u16>,
}

impl RegistrationEventBuilder {
    pub fn context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn path_desc(mut self, path_desc: impl Into<String>) -> Self {
        self.path_desc = path_desc.into();
        self
    }

    pub fn rpc_type(mut self, rpc_type: RpcType) -> Self {
        self.rpc_type = Some(rpc_type);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn rule_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = rule_name.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Validate and freeze the event.
    ///
    /// `rpc_type` defaults to HTTP, `enabled` to true, and an empty
    /// `rule_name` to the path.
    pub fn build(self) -> Result<RegistrationEvent> {
        for (field, value) in [
            ("context_path", &self.context_path),
            ("app_name", &self.app_name),
            ("path", &self.path),
        ] {
            if is_blank(value) {
                return Err(RegistrarError::missing_event_field(field));
            }
        }

        let rule_name = if self.rule_name.is_empty() {
            self.path.clone()
        } else {
            self.rule_name
        };

        Ok(RegistrationEvent {
            context_path: self.context_path,
            app_name: self.app_name,
            path: self.path,
            path_desc: self.path_desc,
            rpc_type: self.rpc_type.unwrap_or(RpcType::Http),
            enabled: self.enabled.unwrap_or(true),
            rule_name,
            host: self.host,
            port: self.port,
        })
    }
}

impl TryFrom<RegistrationEventBuilder> for RegistrationEvent {
    type Error = RegistrarError;

    fn try_from(builder: RegistrationEventBuilder) -> Result<Self> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let event = RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .path("/api/orders")
            .build()
            .unwrap();

        assert_eq!(event.rule_name(), "/api/orders");
        assert_eq!(event.rpc_type(), RpcType::Http);
        assert!(event.enabled());
        assert!(!event.is_full_context());
    }

    #[test]
    fn test_builder_rejects_missing_required_fields() {
        let err = RegistrationEvent::builder()
            .context_path("/api")
            .path("/api/orders")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("app_name"));

        let err = RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent_host() {
        let event = RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .path("/api/orders")
            .rpc_type(RpcType::SpringCloud)
            .build()
            .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["contextPath"], "/api");
        assert_eq!(json["ruleName"], "/api/orders");
        assert_eq!(json["rpcType"], "springCloud");
        assert!(json.get("host").is_none());
        assert!(json.get("port").is_none());
    }

    #[test]
    fn test_deserialization_enforces_invariants() {
        let missing_app: std::result::Result<RegistrationEvent, _> =
            serde_json::from_str(r#"{"contextPath":"/api","path":"/api/x"}"#);
        assert!(missing_app.is_err());

        let event: RegistrationEvent = serde_json::from_str(
            r#"{"contextPath":"/api","appName":"orders","path":"/api/**","host":"10.0.0.1","port":8080}"#,
        )
        .unwrap();
        assert_eq!(event.rule_name(), "/api/**");
        assert!(event.is_full_context());
    }

    #[test]
    fn test_display_is_compact() {
        let event = RegistrationEvent::builder()
            .context_path("/api")
            .app_name("orders")
            .path("/api/orders")
            .build()
            .unwrap();
        assert_eq!(event.to_string(), "orders:/api/orders [http]");
    }
}
