//! Ollama-compatible provider
//!
//! Single requests only; the Ollama API has no batch job surface, so the
//! batch operations report `BatchUnsupported` and the capability flag lets
//! the dispatcher fail fast before submitting anything.

use contracts::{ApiClient, ApiRequest, BatchHandle, BatchPoll, ContractError};
use serde_json::Value;
use tracing::instrument;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama-compatible HTTP client.
#[derive(Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

impl ApiClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn supports_native_batch(&self) -> bool {
        false
    }

    #[instrument(
        name = "ollama_send_one",
        skip(self, request),
        fields(custom_id = %request.custom_id)
    )]
    async fn send_one(&self, request: &ApiRequest) -> Result<Value, ContractError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request.body)
            .send()
            .await
            .map_err(|e| ContractError::request(request.custom_id.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContractError::request(
                request.custom_id.as_str(),
                format!("http {status}: {text}"),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ContractError::request(request.custom_id.as_str(), e.to_string()))
    }

    async fn submit_batch(&self, _requests: &[ApiRequest]) -> Result<BatchHandle, ContractError> {
        Err(ContractError::BatchUnsupported {
            provider: "ollama".to_string(),
        })
    }

    async fn poll_batch(&self, _handle: &BatchHandle) -> Result<BatchPoll, ContractError> {
        Err(ContractError::BatchUnsupported {
            provider: "ollama".to_string(),
        })
    }
}
