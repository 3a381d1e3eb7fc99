//! Mock API client
//!
//! Scriptable implementation for unit and end-to-end tests, with failure
//! injection, per-request latency, and batch poll scripts. Also tracks the
//! number of concurrently outstanding calls so tests can assert admission
//! ceilings.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use contracts::{ApiClient, ApiRequest, BatchHandle, BatchPoll, ContractError};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

/// Mock client configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// custom_ids whose `send_one` fails with an injected transport error
    pub fail_requests: Vec<String>,

    /// Scripted response bodies per custom_id (default: echo body)
    pub responses: HashMap<String, Value>,

    /// Artificial per-request latency in milliseconds
    pub delays_ms: HashMap<String, u64>,

    /// Whether the mock advertises the native batch capability
    pub native_batch: bool,

    /// Injected submission failure message
    pub fail_submit: Option<String>,

    /// Poll results consumed in order; an exhausted script keeps pending
    pub poll_script: Vec<BatchPoll>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_requests: Vec::new(),
            responses: HashMap::new(),
            delays_ms: HashMap::new(),
            native_batch: true,
            fail_submit: None,
            poll_script: Vec::new(),
        }
    }
}

/// Mock API client
pub struct MockApiClient {
    config: MockConfig,
    /// Calls currently outstanding
    in_flight: AtomicUsize,
    /// High-water mark of outstanding calls
    max_in_flight: AtomicUsize,
    /// Total `send_one` calls
    call_count: AtomicU64,
    /// Total `poll_batch` calls
    poll_count: AtomicU64,
    /// custom_ids in the order they were admitted
    sent_order: Mutex<Vec<String>>,
    /// Requests captured by `submit_batch`
    submitted: Mutex<Vec<ApiRequest>>,
    /// Remaining poll script
    polls: Mutex<VecDeque<BatchPoll>>,
}

impl MockApiClient {
    /// Create default mock client
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create mock client with scripted behavior
    pub fn with_config(config: MockConfig) -> Self {
        let polls = Mutex::new(config.poll_script.iter().cloned().collect());
        Self {
            config,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            call_count: AtomicU64::new(0),
            poll_count: AtomicU64::new(0),
            sent_order: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            polls,
        }
    }

    /// Highest number of calls ever outstanding at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total `send_one` calls made
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Total `poll_batch` calls made
    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::SeqCst)
    }

    /// custom_ids in admission order
    pub fn sent_order(&self) -> Vec<String> {
        self.sent_order.lock().unwrap().clone()
    }

    /// custom_ids captured by `submit_batch`
    pub fn submitted_ids(&self) -> Vec<String> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.custom_id.to_string())
            .collect()
    }

    /// Build a provider-shaped batch result record for poll scripts.
    pub fn result_record(custom_id: &str, body: Value) -> Value {
        json!({
            "custom_id": custom_id,
            "response": {"body": body},
            "error": null,
        })
    }

    fn default_response(request: &ApiRequest) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": format!("response for {}", request.custom_id),
                }
            }]
        })
    }
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient for MockApiClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn supports_native_batch(&self) -> bool {
        self.config.native_batch
    }

    async fn send_one(&self, request: &ApiRequest) -> Result<Value, ContractError> {
        let custom_id = request.custom_id.as_str();
        self.sent_order.lock().unwrap().push(custom_id.to_string());
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        let delay = self.config.delays_ms.get(custom_id).copied().unwrap_or(0);
        if delay > 0 {
            sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.config.fail_requests.iter().any(|id| id == custom_id) {
            return Err(ContractError::request(custom_id, "injected transport error"));
        }

        Ok(self
            .config
            .responses
            .get(custom_id)
            .cloned()
            .unwrap_or_else(|| Self::default_response(request)))
    }

    async fn submit_batch(&self, requests: &[ApiRequest]) -> Result<BatchHandle, ContractError> {
        if let Some(message) = &self.config.fail_submit {
            return Err(ContractError::submission("mock", message.clone()));
        }

        self.submitted.lock().unwrap().extend_from_slice(requests);
        Ok(BatchHandle::new("mock-batch-1"))
    }

    async fn poll_batch(&self, _handle: &BatchHandle) -> Result<BatchPoll, ContractError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(BatchPoll::pending))
    }
}
