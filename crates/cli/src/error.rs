//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Plan file not found
    #[error("Plan file not found: {path}")]
    PlanNotFound { path: String },

    /// Request file not found
    #[error("Request file not found: {path}")]
    RequestFileNotFound { path: String },

    /// Plan validation error
    #[error("Plan validation failed: {message}")]
    PlanValidation { message: String },

    /// Batch execution error
    #[error("Batch execution failed: {message}")]
    BatchExecution { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn plan_not_found(path: impl Into<String>) -> Self {
        Self::PlanNotFound { path: path.into() }
    }

    pub fn request_file_not_found(path: impl Into<String>) -> Self {
        Self::RequestFileNotFound { path: path.into() }
    }

    pub fn plan_validation(message: impl Into<String>) -> Self {
        Self::PlanValidation {
            message: message.into(),
        }
    }

    pub fn batch_execution(message: impl Into<String>) -> Self {
        Self::BatchExecution {
            message: message.into(),
        }
    }
}
