//! # Endpoint Scan Processor
//!
//! Turns controller descriptors into per-endpoint registrations.
//!
//! ## Overview
//!
//! The hosting framework discovers components and reports each one as a
//! [`ControllerDescriptor`], once per initialized component. The processor
//! decides what, if anything, to announce:
//!
//! 1. Full mode: nothing, the context listener covers the whole instance
//! 2. No controller marker: nothing
//! 3. No class-level endpoint annotation: nothing, method annotations ignored
//! 4. Catch-all class path: one event from the class annotation, no prefix
//! 5. Otherwise one event per annotated method, prefixed with the class path

use crate::config::{ProcessorSettings, RegisterCenterConfig};
use crate::error::Result;
use crate::events::{PublishOutcome, RegistrationPublisher};
use crate::logging::{log_error, log_registration_operation};
use crate::metadata::{build_endpoint_event, is_catch_all, EndpointAnnotation};
use crate::registry::RegistryBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Component-level markers that identify a request-handling controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerMarker {
    Controller,
    RestController,
    RequestMapping,
}

/// One handler method of a controller, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerMethod {
    pub name: String,
    #[serde(default)]
    pub annotation: Option<EndpointAnnotation>,
}

impl HandlerMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    pub fn annotated(name: impl Into<String>, annotation: EndpointAnnotation) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation),
        }
    }
}

/// What the scanning collaborator knows about one initialized component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerDescriptor {
    pub type_name: String,
    #[serde(default)]
    pub markers: Vec<ControllerMarker>,
    #[serde(default)]
    pub class_annotation: Option<EndpointAnnotation>,
    #[serde(default)]
    pub methods: Vec<HandlerMethod>,
}

impl ControllerDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_marker(mut self, marker: ControllerMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_class_annotation(mut self, annotation: EndpointAnnotation) -> Self {
        self.class_annotation = Some(annotation);
        self
    }

    pub fn with_method(mut self, method: HandlerMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_controller(&self) -> bool {
        !self.markers.is_empty()
    }
}

#[derive(Debug)]
pub struct EndpointScanProcessor {
    settings: ProcessorSettings,
    publisher: Arc<RegistrationPublisher>,
}

impl EndpointScanProcessor {
    /// Validate configuration and start the shared publisher
    pub fn new(
        config: &RegisterCenterConfig,
        application_name: Option<&str>,
        publisher: Arc<RegistrationPublisher>,
        backend: Arc<dyn RegistryBackend>,
    ) -> Result<Self> {
        let settings = config.processor_settings(application_name).map_err(|e| {
            log_error(
                "endpoint_scan_processor",
                "validate_config",
                &e.to_string(),
                Some(&config.register_type),
            );
            e
        })?;

        publisher.start(backend)?;

        Ok(Self {
            settings,
            publisher,
        })
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Handle one component initialized signal
    ///
    /// Returns how many events were accepted by the publisher.
    pub fn on_component_initialized(&self, descriptor: &ControllerDescriptor) -> usize {
        if self.settings.is_full || !descriptor.is_controller() {
            return 0;
        }
        let Some(class_annotation) = &descriptor.class_annotation else {
            return 0;
        };

        if is_catch_all(&class_annotation.path) {
            debug!(
                type_name = %descriptor.type_name,
                path = %class_annotation.path,
                "Catch-all controller, registering class path only"
            );
            return self.publish(descriptor, class_annotation, "");
        }

        let pre_path = class_annotation.path.as_str();
        let accepted: usize = descriptor
            .methods
            .iter()
            .filter_map(|method| method.annotation.as_ref())
            .map(|annotation| self.publish(descriptor, annotation, pre_path))
            .sum();

        let details = format!("{} endpoint(s) queued", accepted);
        log_registration_operation(
            "endpoint_scan",
            self.settings.identity.app_name(),
            Some(&descriptor.type_name),
            "scanned",
            Some(&details),
        );
        accepted
    }

    fn publish(
        &self,
        descriptor: &ControllerDescriptor,
        annotation: &EndpointAnnotation,
        pre_path: &str,
    ) -> usize {
        let event = build_endpoint_event(annotation, pre_path, &self.settings.identity);
        match self.publisher.publish(event) {
            PublishOutcome::Accepted => 1,
            outcome => {
                warn!(
                    type_name = %descriptor.type_name,
                    path = %annotation.path,
                    outcome = ?outcome,
                    "Endpoint registration not queued"
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublisherConfig;
    use crate::registry::InMemoryBackend;

    fn config() -> RegisterCenterConfig {
        RegisterCenterConfig::new("memory", "localhost:9095").with_prop("contextPath", "/api")
    }

    fn processor(
        config: &RegisterCenterConfig,
    ) -> (EndpointScanProcessor, Arc<RegistrationPublisher>, Arc<InMemoryBackend>) {
        let publisher = Arc::new(RegistrationPublisher::new(PublisherConfig::default()));
        let backend = Arc::new(InMemoryBackend::new());
        let processor =
            EndpointScanProcessor::new(config, Some("orders"), Arc::clone(&publisher), backend.clone())
                .unwrap();
        (processor, publisher, backend)
    }

    fn user_controller() -> ControllerDescriptor {
        ControllerDescriptor::new("UserController")
            .with_marker(ControllerMarker::RestController)
            .with_class_annotation(EndpointAnnotation::new("/user"))
            .with_method(HandlerMethod::annotated("info", EndpointAnnotation::new("/info")))
            .with_method(HandlerMethod::new("helper"))
            .with_method(HandlerMethod::annotated(
                "save",
                EndpointAnnotation::new("/save").with_rule_name("user-save"),
            ))
    }

    #[test]
    fn test_publishes_one_event_per_annotated_method() {
        let (processor, publisher, backend) = processor(&config());

        assert_eq!(processor.on_component_initialized(&user_controller()), 2);
        publisher.shutdown();

        let events = backend.events();
        assert_eq!(events[0].path(), "/api/user/info");
        assert_eq!(events[0].rule_name(), "/api/user/info");
        assert_eq!(events[1].path(), "/api/user/save");
        assert_eq!(events[1].rule_name(), "user-save");
    }

    #[test]
    fn test_catch_all_class_path() {
        let (processor, publisher, backend) = processor(&config());
        let descriptor = ControllerDescriptor::new("ProxyController")
            .with_marker(ControllerMarker::Controller)
            .with_class_annotation(EndpointAnnotation::new("/ab*cd"))
            .with_method(HandlerMethod::annotated("m", EndpointAnnotation::new("/m")));

        assert_eq!(processor.on_component_initialized(&descriptor), 1);
        publisher.shutdown();

        let events = backend.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path(), "/api/ab*cd");
    }

    #[test]
    fn test_skips_without_marker_or_class_annotation() {
        let (processor, publisher, backend) = processor(&config());

        let mut unmarked = user_controller();
        unmarked.markers.clear();
        assert_eq!(processor.on_component_initialized(&unmarked), 0);

        let mut unmapped = user_controller();
        unmapped.class_annotation = None;
        assert_eq!(processor.on_component_initialized(&unmapped), 0);

        publisher.shutdown();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_full_mode_is_noop() {
        let (processor, publisher, backend) = processor(&config().with_prop("isFull", "TRUE"));
        assert_eq!(processor.on_component_initialized(&user_controller()), 0);
        publisher.shutdown();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_missing_application_name_fails() {
        let publisher = Arc::new(RegistrationPublisher::new(PublisherConfig::default()));
        let result = EndpointScanProcessor::new(
            &config(),
            Some("  "),
            Arc::clone(&publisher),
            Arc::new(InMemoryBackend::new()),
        );
        assert!(result.is_err());
        assert!(!publisher.is_started());
    }
}
