//! ApiRequest - one record of the request file
//!
//! The request file is newline-delimited JSON in the OpenAI batch input
//! format: each line carries a `custom_id`, an HTTP method and endpoint
//! path, and an opaque body shaped for the target API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RequestId;

/// One prompt request, immutable once handed to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Unique identifier within a batch; the only correlation key
    pub custom_id: RequestId,

    /// HTTP method for the target endpoint
    #[serde(default = "default_method")]
    pub method: String,

    /// Endpoint path relative to the provider base URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Opaque request body (model, messages, sampling options, ...)
    pub body: Value,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_url() -> String {
    "/v1/chat/completions".to_string()
}

impl ApiRequest {
    /// Create a request with default method and endpoint.
    pub fn new(custom_id: impl Into<RequestId>, body: Value) -> Self {
        Self {
            custom_id: custom_id.into(),
            method: default_method(),
            url: default_url(),
            body,
        }
    }
}
