//! OpenAI-compatible provider
//!
//! Single requests go straight to the configured chat endpoint. Native
//! batch jobs follow the files/batches flow: upload the request file,
//! create a batch job against it, poll the job, then download and parse
//! the output file.

use contracts::{
    ApiClient, ApiRequest, BatchHandle, BatchPoll, ContractError,
};
use reqwest::multipart;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible HTTP client.
#[derive(Debug)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    endpoint: String,
    completion_window: String,
}

impl OpenAiClient {
    /// Create a client against the default or a custom base URL.
    ///
    /// `endpoint` and `completion_window` are used for batch job creation
    /// only; single requests use each record's own `url` field.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        endpoint: impl Into<String>,
        completion_window: impl Into<String>,
    ) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            completion_window: completion_window.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Serialize requests into the provider's JSONL upload format.
    fn batch_payload(requests: &[ApiRequest]) -> Result<Vec<u8>, ContractError> {
        let mut payload = Vec::new();
        for request in requests {
            serde_json::to_writer(&mut payload, request)
                .map_err(|e| ContractError::payload_parse("openai", e.to_string()))?;
            payload.push(b'\n');
        }
        Ok(payload)
    }

    /// Upload the request file, returns the provider file id.
    async fn upload_batch_file(&self, payload: Vec<u8>) -> Result<String, ContractError> {
        let part = multipart::Part::bytes(payload)
            .file_name("requests.jsonl")
            .mime_str("application/jsonl")
            .map_err(|e| ContractError::submission("openai", e.to_string()))?;
        let form = multipart::Form::new()
            .text("purpose", "batch")
            .part("file", part);

        let response = self
            .http
            .post(self.url("/v1/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ContractError::submission("openai", e.to_string()))?;

        let body = Self::check_json(response, |message| {
            ContractError::submission("openai", message)
        })
        .await?;

        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ContractError::submission("openai", "file upload response carries no id")
            })
    }

    /// Download and parse the batch output file.
    async fn fetch_output_records(&self, file_id: &str) -> Result<Vec<Value>, ContractError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/files/{file_id}/content")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ContractError::payload_parse("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContractError::payload_parse(
                "openai",
                format!("output file download failed with {status}: {text}"),
            ));
        }

        let content = response
            .text()
            .await
            .map_err(|e| ContractError::payload_parse("openai", e.to_string()))?;

        let mut records = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(line).map_err(|e| {
                ContractError::payload_parse(
                    "openai",
                    format!("output file line {}: {e}", line_number + 1),
                )
            })?;
            records.push(record);
        }

        debug!(records = records.len(), "batch output file parsed");
        Ok(records)
    }

    /// First error message out of a batch job's error list, if any.
    fn job_error_message(job: &Value) -> Option<String> {
        job.pointer("/errors/data/0/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn check_json<F>(response: reqwest::Response, to_error: F) -> Result<Value, ContractError>
    where
        F: FnOnce(String) -> ContractError,
    {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(to_error(format!("http {status}: {text}")));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| to_error(e.to_string()))
    }
}

impl ApiClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn supports_native_batch(&self) -> bool {
        true
    }

    #[instrument(
        name = "openai_send_one",
        skip(self, request),
        fields(custom_id = %request.custom_id)
    )]
    async fn send_one(&self, request: &ApiRequest) -> Result<Value, ContractError> {
        let response = self
            .http
            .post(self.url(&request.url))
            .bearer_auth(&self.api_key)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| ContractError::request(request.custom_id.as_str(), e.to_string()))?;

        Self::check_json(response, |message| {
            ContractError::request(request.custom_id.as_str(), message)
        })
        .await
    }

    #[instrument(
        name = "openai_submit_batch",
        skip(self, requests),
        fields(request_count = requests.len())
    )]
    async fn submit_batch(&self, requests: &[ApiRequest]) -> Result<BatchHandle, ContractError> {
        let payload = Self::batch_payload(requests)?;
        let input_file_id = self.upload_batch_file(payload).await?;

        debug!(file_id = %input_file_id, "batch input file uploaded");

        let response = self
            .http
            .post(self.url("/v1/batches"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input_file_id": input_file_id,
                "endpoint": self.endpoint,
                "completion_window": self.completion_window,
            }))
            .send()
            .await
            .map_err(|e| ContractError::submission("openai", e.to_string()))?;

        let job = Self::check_json(response, |message| {
            ContractError::submission("openai", message)
        })
        .await?;

        let job_id = job["id"].as_str().ok_or_else(|| {
            ContractError::submission("openai", "batch creation response carries no id")
        })?;

        Ok(BatchHandle::new(job_id))
    }

    #[instrument(name = "openai_poll_batch", skip(self), fields(job_id = %handle))]
    async fn poll_batch(&self, handle: &BatchHandle) -> Result<BatchPoll, ContractError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/batches/{}", handle.as_str())))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ContractError::payload_parse("openai", e.to_string()))?;

        let job = Self::check_json(response, |message| {
            ContractError::payload_parse("openai", message)
        })
        .await?;

        let status = job["status"].as_str().unwrap_or("unknown");
        match status {
            "completed" => {
                let Some(file_id) = job["output_file_id"].as_str() else {
                    // Should not happen; the provider marks jobs completed
                    // only once the output file exists.
                    return Ok(BatchPoll::failed("completed job carries no output file"));
                };
                let records = self.fetch_output_records(file_id).await?;
                Ok(BatchPoll::completed(records))
            }
            "failed" | "cancelled" | "cancelling" => {
                let reason = Self::job_error_message(&job)
                    .unwrap_or_else(|| format!("provider reported status '{status}'"));
                Ok(BatchPoll::failed(reason))
            }
            "expired" => {
                let reason = Self::job_error_message(&job)
                    .unwrap_or_else(|| "batch job expired".to_string());
                Ok(BatchPoll::expired(reason))
            }
            "validating" | "in_progress" | "finalizing" => Ok(BatchPoll::pending()),
            other => {
                warn!(status = other, "unrecognized batch status, treating as pending");
                Ok(BatchPoll::pending())
            }
        }
    }
}
