//! Layered error definitions
//!
//! Categorized by source: config / template / dump

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Template Errors =====
    /// Naming pattern could not be compiled
    #[error("parsing pattern '{pattern}' as template failed: {message}")]
    TemplateParse { pattern: String, message: String },

    /// Naming pattern could not be rendered with the given data
    #[error("executing template '{pattern}' failed: {message}")]
    TemplateRender { pattern: String, message: String },

    // ===== Dump Errors =====
    /// Destination could not be created
    #[error("creating file '{destination}' failed: {source}")]
    DumpCreate {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be written to the destination
    #[error("writing to file '{destination}' failed: {source}")]
    DumpWrite {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// Strategy-specific dump failure
    #[error("dump to '{destination}' failed: {message}")]
    Dump {
        destination: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create template parse error
    pub fn template_parse(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateParse {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create template render error
    pub fn template_render(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateRender {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create strategy-specific dump error
    pub fn dump(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dump {
            destination: destination.into(),
            message: message.into(),
        }
    }
}
