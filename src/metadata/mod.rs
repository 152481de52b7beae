//! # Metadata Builder
//!
//! Pure functions that turn scan-site inputs into [`RegistrationEvent`]s.
//!
//! - Path composition: `context_path + pre_path + annotation_path`
//! - Rule name falls back to the composed path when left empty
//! - A path whose first `*` sits past index 1 marks a catch-all controller
//! - Full registration describes the whole instance as `context_path + "/**"`
//!
//! Nothing here holds state. Inputs are validated upstream, at listener and
//! processor construction, so building over a [`ServiceIdentity`] cannot
//! yield an event that violates the registration invariants.

pub mod host;

use crate::config::{is_blank, ConfigResult, ConfigurationError};
use crate::constants::{props, RpcType, FULL_PATH_SUFFIX, WILDCARD};
use crate::events::RegistrationEvent;
use serde::{Deserialize, Serialize};

pub use host::{resolve_host, HostResolver, LocalHostResolver, StaticHostResolver};

/// Context path and application name shared by every event of one service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    context_path: String,
    app_name: String,
}

impl ServiceIdentity {
    pub fn new(context_path: impl Into<String>, app_name: impl Into<String>) -> ConfigResult<Self> {
        let context_path = context_path.into();
        let app_name = app_name.into();

        let mut missing = Vec::new();
        if is_blank(&context_path) {
            missing.push(props::CONTEXT_PATH.to_string());
        }
        if is_blank(&app_name) {
            missing.push(props::APP_NAME.to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigurationError::missing_fields(missing, "service identity"));
        }

        Ok(Self {
            context_path,
            app_name,
        })
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

/// Attributes of an endpoint annotation as reported by the scanning collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointAnnotation {
    pub path: String,
    pub desc: String,
    pub rule_name: String,
    pub rpc_type: RpcType,
    pub enabled: bool,
}

impl Default for EndpointAnnotation {
    fn default() -> Self {
        Self {
            path: String::new(),
            desc: String::new(),
            rule_name: String::new(),
            rpc_type: RpcType::SpringCloud,
            enabled: true,
        }
    }
}

impl EndpointAnnotation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_rule_name(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = rule_name.into();
        self
    }

    pub fn with_rpc_type(mut self, rpc_type: RpcType) -> Self {
        self.rpc_type = rpc_type;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// `context_path + pre_path + annotation_path`, no normalization
pub fn compose_path(context_path: &str, pre_path: &str, annotation_path: &str) -> String {
    let mut path = String::with_capacity(context_path.len() + pre_path.len() + annotation_path.len());
    path.push_str(context_path);
    path.push_str(pre_path);
    path.push_str(annotation_path);
    path
}

/// Whether a class-level path routes the whole controller to one handler.
///
/// Only a wildcard whose first occurrence is past index 1 counts. `*` and
/// `/*` are deliberately not catch-alls.
pub fn is_catch_all(path: &str) -> bool {
    // Index in UTF-16 code units
    path.find(WILDCARD)
        .is_some_and(|byte_index| path[..byte_index].encode_utf16().count() > 1)
}

/// Build the event for one annotated endpoint
pub fn build_endpoint_event(
    annotation: &EndpointAnnotation,
    pre_path: &str,
    identity: &ServiceIdentity,
) -> RegistrationEvent {
    let path = compose_path(identity.context_path(), pre_path, &annotation.path);
    let rule_name = if annotation.rule_name.is_empty() {
        path.clone()
    } else {
        annotation.rule_name.clone()
    };

    RegistrationEvent::from_parts(
        identity.context_path().to_string(),
        identity.app_name().to_string(),
        path,
        annotation.desc.clone(),
        annotation.rpc_type,
        annotation.enabled,
        rule_name,
        None,
        None,
    )
}

/// Build the single event describing the whole service instance
pub fn build_full_event(identity: &ServiceIdentity, host: impl Into<String>, port: u16) -> RegistrationEvent {
    let path = compose_path(identity.context_path(), "", FULL_PATH_SUFFIX);

    RegistrationEvent::from_parts(
        identity.context_path().to_string(),
        identity.app_name().to_string(),
        path.clone(),
        String::new(),
        RpcType::Http,
        true,
        path,
        Some(host.into()),
        Some(port),
    )
}
