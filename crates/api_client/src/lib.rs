//! # API Client
//!
//! Concrete provider implementations of the `ApiClient` contract.
//!
//! Responsibilities:
//! - OpenAI-compatible provider (single requests + native batch jobs)
//! - Ollama-compatible provider (single requests only)
//! - Provider factory mapping a config tag to a constructor
//! - Scriptable mock client for tests

mod factory;
mod mock_client;
mod ollama;
mod openai;

pub use factory::{build_client, ProviderClient};
pub use mock_client::{MockApiClient, MockConfig};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
