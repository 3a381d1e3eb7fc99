//! RunPlan - Config Loader output
//!
//! Describes one complete run: provider endpoint, execution strategy and
//! knobs, result destination.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ExecutionConfig;

/// Complete run configuration blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    /// Provider settings
    pub api: ApiConfig,

    /// Strategy selection and numeric knobs
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Result materialization settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Known provider families.
///
/// Picking one of N known shapes at config time; the client factory maps
/// each tag to a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible HTTP API (chat completions + files + batches)
    Openai,
    /// Ollama-compatible HTTP API (single requests only)
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider endpoint settings. The API key itself never lives in the plan;
/// only the name of the environment variable that holds it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub provider: ProviderKind,

    /// Base URL override (defaults per provider)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Endpoint path for batch submissions
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Provider completion window for batch jobs
    #[serde(default = "default_completion_window")]
    pub completion_window: String,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_endpoint() -> String {
    "/v1/chat/completions".to_string()
}

fn default_completion_window() -> String {
    "24h".to_string()
}

/// Result materialization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination spec; a trailing path separator selects per-id mode
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Strip records down to the extracted response content
    #[serde(default)]
    pub content_only: bool,

    /// Sink worker queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_destination() -> String {
    "results.jsonl".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            content_only: false,
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Resolved materialization layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// All outcomes appended to one JSONL stream
    Aggregate(PathBuf),
    /// One file per outcome, named by its id
    PerRequest(PathBuf),
}

impl OutputConfig {
    /// Resolve the destination spec into a layout.
    ///
    /// `results/` is a directory of per-id files; `results.jsonl` is one
    /// aggregate stream.
    pub fn target(&self) -> OutputTarget {
        if self.destination.ends_with('/') || self.destination.ends_with(std::path::MAIN_SEPARATOR)
        {
            OutputTarget::PerRequest(PathBuf::from(&self.destination))
        } else {
            OutputTarget::Aggregate(PathBuf::from(&self.destination))
        }
    }
}
