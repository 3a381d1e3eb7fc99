//! Execution configuration contracts shared across crates.

use serde::{Deserialize, Serialize};

/// Execution strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Submit everything as one provider-side batch job and poll it
    NativeBatch,
    /// One request at a time, in input order
    Synchronous,
    /// Up to `concurrency` requests in flight, completion order unspecified
    Asynchronous,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeBatch => "native_batch",
            Self::Synchronous => "synchronous",
            Self::Asynchronous => "asynchronous",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution configuration, immutable for the duration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Strategy to drive the batch with
    #[serde(default = "default_mode")]
    pub mode: ExecutionMode,

    /// Seconds between batch status polls (native batch mode)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait between consecutive requests (synchronous mode)
    #[serde(default = "default_request_interval")]
    pub request_interval_secs: u64,

    /// In-flight request ceiling (asynchronous mode), must be >= 1
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Field to read the request id from in provider batch result records
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Give up polling after this many seconds (None = poll forever);
    /// pending ids then fail with the expired kind
    #[serde(default)]
    pub max_poll_secs: Option<u64>,

    /// Per-request retry behavior
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_mode() -> ExecutionMode {
    ExecutionMode::Synchronous
}

fn default_poll_interval() -> u64 {
    300
}

fn default_request_interval() -> u64 {
    1
}

fn default_concurrency() -> usize {
    4
}

fn default_id_field() -> String {
    "custom_id".to_string()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            poll_interval_secs: default_poll_interval(),
            request_interval_secs: default_request_interval(),
            concurrency: default_concurrency(),
            id_field: default_id_field(),
            max_poll_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Opt-in retry for transient per-request failures.
///
/// Disabled by default: silent retries change observed costs, so callers
/// must ask for them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first failure (0 = disabled)
    #[serde(default)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
}

fn default_backoff() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            backoff_secs: default_backoff(),
        }
    }
}

impl RetryConfig {
    pub fn enabled(&self) -> bool {
        self.max_attempts > 0
    }
}
