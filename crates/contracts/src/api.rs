//! ApiClient trait - remote API boundary
//!
//! Abstracts the generative-model provider. The two single-request modes
//! need only `send_one`; native batch mode additionally needs the
//! `submit_batch`/`poll_batch` pair, advertised via a capability flag.

use serde_json::Value;

use crate::{ApiRequest, ContractError};

/// Opaque provider-issued identifier for a submitted batch job.
///
/// Owned by the dispatcher for the lifetime of polling, discarded after
/// terminal retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHandle(pub String);

impl BatchHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-side batch job state as seen by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchJobState {
    /// Job not terminal yet, keep polling
    Pending,
    /// Results are ready for retrieval
    Completed,
    /// Provider aborted the job
    Failed,
    /// Job expired before completing
    Expired,
}

impl BatchJobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

/// Result of one `poll_batch` call.
#[derive(Debug, Clone)]
pub struct BatchPoll {
    pub state: BatchJobState,

    /// Raw result records, present once `state` is `Completed`. Each record
    /// is correlated back to a request by the configured id field.
    pub results: Option<Vec<Value>>,

    /// Provider-supplied reason for `Failed`/`Expired` states
    pub reason: Option<String>,
}

impl BatchPoll {
    pub fn pending() -> Self {
        Self {
            state: BatchJobState::Pending,
            results: None,
            reason: None,
        }
    }

    pub fn completed(results: Vec<Value>) -> Self {
        Self {
            state: BatchJobState::Completed,
            results: Some(results),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: BatchJobState::Failed,
            results: None,
            reason: Some(reason.into()),
        }
    }

    pub fn expired(reason: impl Into<String>) -> Self {
        Self {
            state: BatchJobState::Expired,
            results: None,
            reason: Some(reason.into()),
        }
    }
}

/// Generative-model API client trait
///
/// All provider implementations must implement this trait. Providers without
/// a native batch endpoint return `ContractError::BatchUnsupported` from the
/// batch operations and advertise `supports_native_batch() == false` so the
/// dispatcher can fail fast before any dispatch.
#[trait_variant::make(ApiClient: Send)]
pub trait LocalApiClient {
    /// Provider name (used for logging/errors)
    fn provider_name(&self) -> &str;

    /// Whether the `submit_batch`/`poll_batch` pair is implemented
    fn supports_native_batch(&self) -> bool;

    /// Send one request and wait for the full response body.
    ///
    /// # Errors
    /// Returns a per-request error; callers convert it to a failure outcome.
    async fn send_one(&self, request: &ApiRequest) -> Result<Value, ContractError>;

    /// Submit all requests as one provider-side batch job.
    ///
    /// # Errors
    /// Any error here is fatal for the whole batch.
    async fn submit_batch(&self, requests: &[ApiRequest]) -> Result<BatchHandle, ContractError>;

    /// Poll a submitted job once.
    async fn poll_batch(&self, handle: &BatchHandle) -> Result<BatchPoll, ContractError>;
}
