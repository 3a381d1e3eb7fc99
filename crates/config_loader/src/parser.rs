//! Plan parsing module
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{ContractError, RunPlan};

/// Plan file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse plan content in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<RunPlan, ContractError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("TOML parse error: {e}"),
            source: Some(Box::new(e)),
        }),
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ProviderKind;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("JSON"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_parse_json() {
        let plan = parse(r#"{"api": {"provider": "ollama"}}"#, ConfigFormat::Json).unwrap();
        assert_eq!(plan.api.provider, ProviderKind::Ollama);
    }

    #[test]
    fn test_parse_error_carries_source() {
        let err = parse("not toml at all [", ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
