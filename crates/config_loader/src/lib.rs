//! # Config Loader
//!
//! Run-plan loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON plan files
//! - Validate plan legality
//! - Generate `RunPlan`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let plan = ConfigLoader::load_from_path(Path::new("plan.toml")).unwrap();
//! println!("Provider: {}", plan.api.provider);
//! ```

mod parser;
mod validator;

pub use contracts::RunPlan;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Run-plan loader
///
/// Provides static methods to load a plan from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load plan from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RunPlan, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load plan from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RunPlan, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize RunPlan to TOML string
    pub fn to_toml(plan: &RunPlan) -> Result<String, ContractError> {
        toml::to_string_pretty(plan)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RunPlan to JSON string
    pub fn to_json(plan: &RunPlan) -> Result<String, ContractError> {
        serde_json::to_string_pretty(plan)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer plan format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read plan file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate plan content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<RunPlan, ContractError> {
        let plan = parser::parse(content, format)?;
        validator::validate(&plan)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ExecutionMode, ProviderKind};

    const MINIMAL_TOML: &str = r#"
[api]
provider = "openai"

[execution]
mode = "synchronous"

[output]
destination = "results.jsonl"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let plan = result.unwrap();
        assert_eq!(plan.api.provider, ProviderKind::Openai);
        assert_eq!(plan.execution.mode, ExecutionMode::Synchronous);
    }

    #[test]
    fn test_round_trip_toml() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(plan.api.provider, plan2.api.provider);
        assert_eq!(plan.execution.mode, plan2.execution.mode);
        assert_eq!(plan.output.destination, plan2.output.destination);
    }

    #[test]
    fn test_round_trip_json() {
        let plan = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&plan).unwrap();
        let plan2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(plan.api.provider, plan2.api.provider);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        // Zero concurrency should fail validation
        let content = r#"
[api]
provider = "openai"

[execution]
mode = "asynchronous"
concurrency = 0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("concurrency"));
    }
}
