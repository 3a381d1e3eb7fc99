//! Dispatcher error types

use contracts::ExecutionMode;
use thiserror::Error;

/// Dispatcher-specific errors
///
/// Every variant here is fatal for the run; per-request failures never
/// surface as errors, they become failure outcomes.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Precondition violation: two requests share an id
    #[error("duplicate custom_id in batch: '{custom_id}'")]
    DuplicateRequestId { custom_id: String },

    /// Selected mode needs a capability the client lacks
    #[error("provider '{provider}' cannot run in {mode} mode")]
    UnsupportedMode {
        mode: ExecutionMode,
        provider: String,
    },

    /// Request file line failed to parse
    #[error("invalid request record at line {line}: {message}")]
    InvalidRequestRecord { line: usize, message: String },

    /// Sink worker disappeared while outcomes were still flowing
    #[error("sink '{sink_name}' worker closed unexpectedly")]
    SinkClosed { sink_name: String },

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Contract-level error (submission, config, io wrapped upstream)
    #[error("{0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
