//! Outcome - terminal per-request result
//!
//! Exactly one outcome exists per request id per run, whatever the remote
//! API does. Serialized as one JSON record per outcome:
//! `{"custom_id": ..., "response": {"body": ...} | null, "error": {...} | null}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RequestId;

/// Terminal result for one request, tagged by its id.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The request produced a response body
    Success {
        custom_id: RequestId,
        response: Value,
    },
    /// The request terminally failed
    Failure {
        custom_id: RequestId,
        error: FailureInfo,
    },
}

/// Structured error carried by a failure outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

/// Failure classification.
///
/// Per-request transport/API errors never abort the run; the other kinds
/// originate from the native batch flow where a whole job fails, expires,
/// or returns an incomplete result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport or API error for this request alone
    Request,
    /// The provider aborted the whole batch job
    ProviderJob,
    /// The batch job expired or polling hit the configured deadline
    Expired,
    /// The provider response omitted this id
    MissingResult,
}

impl Outcome {
    /// Build a success outcome.
    pub fn success(custom_id: impl Into<RequestId>, response: Value) -> Self {
        Self::Success {
            custom_id: custom_id.into(),
            response,
        }
    }

    /// Build a failure outcome.
    pub fn failure(
        custom_id: impl Into<RequestId>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            custom_id: custom_id.into(),
            error: FailureInfo {
                kind,
                message: message.into(),
            },
        }
    }

    /// The id this outcome correlates to.
    pub fn custom_id(&self) -> &RequestId {
        match self {
            Self::Success { custom_id, .. } | Self::Failure { custom_id, .. } => custom_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Extract the assistant message text for content-only projection.
    ///
    /// Looks in the places the supported providers put it: OpenAI-style
    /// `choices[0].message.content`, then Ollama-style `message.content`.
    /// Failures project their error message.
    pub fn content_text(&self) -> String {
        match self {
            Self::Success { response, .. } => response_text(response)
                .map(str::to_string)
                .unwrap_or_else(|| response.to_string()),
            Self::Failure { error, .. } => error.message.clone(),
        }
    }
}

/// Pull the generated text out of a raw response body, if present.
pub fn response_text(response: &Value) -> Option<&str> {
    response
        .pointer("/choices/0/message/content")
        .or_else(|| response.pointer("/message/content"))
        .and_then(Value::as_str)
}

/// On-disk record shape, compatible with provider batch output files.
#[derive(Serialize, Deserialize)]
struct OutcomeRecord {
    custom_id: RequestId,
    response: Option<ResponseRecord>,
    error: Option<FailureInfo>,
}

#[derive(Serialize, Deserialize)]
struct ResponseRecord {
    body: Value,
}

impl Serialize for Outcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let record = match self {
            Self::Success {
                custom_id,
                response,
            } => OutcomeRecord {
                custom_id: custom_id.clone(),
                response: Some(ResponseRecord {
                    body: response.clone(),
                }),
                error: None,
            },
            Self::Failure { custom_id, error } => OutcomeRecord {
                custom_id: custom_id.clone(),
                response: None,
                error: Some(error.clone()),
            },
        };
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let record = OutcomeRecord::deserialize(deserializer)?;
        match (record.response, record.error) {
            (Some(response), None) => Ok(Self::Success {
                custom_id: record.custom_id,
                response: response.body,
            }),
            (_, Some(error)) => Ok(Self::Failure {
                custom_id: record.custom_id,
                error,
            }),
            (None, None) => Err(serde::de::Error::custom(
                "outcome record has neither response nor error",
            )),
        }
    }
}
