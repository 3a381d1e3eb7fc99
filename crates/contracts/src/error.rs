//! Layered error definitions
//!
//! Categorized by source: config / api / batch / sink

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

    /// API key lookup failure
    #[error("api key not found in environment variable '{env_var}'")]
    MissingApiKey { env_var: String },

    // ===== API Errors =====
    /// Per-request transport or API failure
    #[error("api request error for '{custom_id}': {message}")]
    Request { custom_id: String, message: String },

    /// Bulk submission rejected, fatal for the whole batch
    #[error("batch submission error ({provider}): {message}")]
    Submission { provider: String, message: String },

    /// Provider does not implement the native batch operations
    #[error("provider '{provider}' does not support native batch requests")]
    BatchUnsupported { provider: String },

    /// Malformed provider payload (unparseable response or result file)
    #[error("payload parse error ({provider}): {message}")]
    PayloadParse { provider: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

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

    /// Create per-request error
    pub fn request(custom_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            custom_id: custom_id.into(),
            message: message.into(),
        }
    }

    /// Create batch submission error
    pub fn submission(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Submission {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
