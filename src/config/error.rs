//! Configuration Error Types
//!
//! Errors raised while loading and validating registration settings. Every
//! variant names the offending field(s) so a misconfigured service fails
//! fast with an actionable message instead of registering partially.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// One or more required fields are missing or blank
    #[error("Missing required configuration field(s) {fields:?} for {context}")]
    MissingRequiredFields { fields: Vec<String>, context: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// No backend constructor registered for the requested register type
    #[error("Unknown register type '{register_type}', available: {available:?}")]
    UnknownRegisterType {
        register_type: String,
        available: Vec<String>,
    },

    /// Configuration file could not be found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Layered source loading or deserialization failed
    #[error("Failed to load configuration: {error}")]
    Load { error: String },
}

impl ConfigurationError {
    /// Create a missing required fields error
    pub fn missing_fields<C: Into<String>>(fields: Vec<String>, context: C) -> Self {
        Self::MissingRequiredFields {
            fields,
            context: context.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: Into<String>, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    /// Create an unknown register type error
    pub fn unknown_register_type<T: Into<String>>(register_type: T, available: Vec<String>) -> Self {
        Self::UnknownRegisterType {
            register_type: register_type.into(),
            available,
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        Self::Load {
            error: error.to_string(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_every_field() {
        let err = ConfigurationError::missing_fields(
            vec!["contextPath".to_string(), "serverLists".to_string()],
            "endpoint scan processor",
        );
        let message = err.to_string();
        assert!(message.contains("contextPath"));
        assert!(message.contains("serverLists"));
        assert!(message.contains("endpoint scan processor"));
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigurationError::invalid_value("port", "-1", "port must be > 0");
        assert_eq!(
            err.to_string(),
            "Invalid value '-1' for field 'port': port must be > 0"
        );
    }
}
