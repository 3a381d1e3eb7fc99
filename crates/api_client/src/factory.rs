//! Client factory
//!
//! Maps the plan's provider tag to a concrete client constructor. The
//! registry is the `ProviderKind` sum type: adding a provider means adding
//! a variant, a constructor arm, and delegation arms.

use contracts::{
    ApiClient, ApiConfig, ApiRequest, BatchHandle, BatchPoll, ContractError, ProviderKind,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::{OllamaClient, OpenAiClient};

/// One of the known provider clients.
#[derive(Debug)]
pub enum ProviderClient {
    Openai(OpenAiClient),
    Ollama(OllamaClient),
}

/// Build the provider client named by the plan.
///
/// # Errors
/// Returns `MissingApiKey` when the provider requires a key and the named
/// environment variable is unset or empty.
#[instrument(name = "client_factory_build", skip(config), fields(provider = %config.provider))]
pub fn build_client(config: &ApiConfig) -> Result<ProviderClient, ContractError> {
    let client = match config.provider {
        ProviderKind::Openai => {
            let api_key = api_key_from_env(&config.api_key_env)?;
            ProviderClient::Openai(OpenAiClient::new(
                api_key,
                config.base_url.as_deref(),
                &config.endpoint,
                &config.completion_window,
            ))
        }
        // Local inference servers take no credentials
        ProviderKind::Ollama => ProviderClient::Ollama(OllamaClient::new(config.base_url.as_deref())),
    };

    info!(provider = %config.provider, "api client built");
    Ok(client)
}

fn api_key_from_env(env_var: &str) -> Result<String, ContractError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ContractError::MissingApiKey {
            env_var: env_var.to_string(),
        }),
    }
}

impl ApiClient for ProviderClient {
    fn provider_name(&self) -> &str {
        match self {
            Self::Openai(client) => client.provider_name(),
            Self::Ollama(client) => client.provider_name(),
        }
    }

    fn supports_native_batch(&self) -> bool {
        match self {
            Self::Openai(client) => client.supports_native_batch(),
            Self::Ollama(client) => client.supports_native_batch(),
        }
    }

    async fn send_one(&self, request: &ApiRequest) -> Result<Value, ContractError> {
        match self {
            Self::Openai(client) => client.send_one(request).await,
            Self::Ollama(client) => client.send_one(request).await,
        }
    }

    async fn submit_batch(&self, requests: &[ApiRequest]) -> Result<BatchHandle, ContractError> {
        match self {
            Self::Openai(client) => client.submit_batch(requests).await,
            Self::Ollama(client) => client.submit_batch(requests).await,
        }
    }

    async fn poll_batch(&self, handle: &BatchHandle) -> Result<BatchPoll, ContractError> {
        match self {
            Self::Openai(client) => client.poll_batch(handle).await,
            Self::Ollama(client) => client.poll_batch(handle).await,
        }
    }
}
