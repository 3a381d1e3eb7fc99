//! Plan validation module
//!
//! Validation rules:
//! - intervals and concurrency within sane bounds
//! - id field non-empty
//! - api key env var name non-empty
//! - output destination non-empty, queue capacity > 0

use contracts::{ContractError, RunPlan};

/// Validate a RunPlan
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(plan: &RunPlan) -> Result<(), ContractError> {
    validate_api(plan)?;
    validate_execution(plan)?;
    validate_output(plan)?;
    Ok(())
}

fn validate_api(plan: &RunPlan) -> Result<(), ContractError> {
    if plan.api.api_key_env.trim().is_empty() {
        return Err(ContractError::config_validation(
            "api.api_key_env",
            "environment variable name must not be empty",
        ));
    }

    if plan.api.endpoint.trim().is_empty() {
        return Err(ContractError::config_validation(
            "api.endpoint",
            "endpoint path must not be empty",
        ));
    }

    if let Some(base_url) = &plan.api.base_url {
        if base_url.trim().is_empty() {
            return Err(ContractError::config_validation(
                "api.base_url",
                "base URL must not be empty when set",
            ));
        }
    }

    Ok(())
}

fn validate_execution(plan: &RunPlan) -> Result<(), ContractError> {
    let execution = &plan.execution;

    if execution.poll_interval_secs == 0 {
        return Err(ContractError::config_validation(
            "execution.poll_interval_secs",
            "poll interval must be > 0",
        ));
    }

    if execution.concurrency == 0 {
        return Err(ContractError::config_validation(
            "execution.concurrency",
            "concurrency must be >= 1",
        ));
    }

    if execution.id_field.trim().is_empty() {
        return Err(ContractError::config_validation(
            "execution.id_field",
            "id field name must not be empty",
        ));
    }

    if let Some(max_poll_secs) = execution.max_poll_secs {
        if max_poll_secs < execution.poll_interval_secs {
            return Err(ContractError::config_validation(
                "execution.max_poll_secs",
                format!(
                    "poll deadline {max_poll_secs}s is shorter than one poll interval ({}s)",
                    execution.poll_interval_secs
                ),
            ));
        }
    }

    Ok(())
}

fn validate_output(plan: &RunPlan) -> Result<(), ContractError> {
    if plan.output.destination.trim().is_empty() {
        return Err(ContractError::config_validation(
            "output.destination",
            "destination must not be empty",
        ));
    }

    if plan.output.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "output.queue_capacity",
            "queue capacity must be >= 1",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ConfigFormat};

    fn plan_from(toml: &str) -> RunPlan {
        parse(toml, ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn test_minimal_plan_is_valid() {
        let plan = plan_from("[api]\nprovider = \"openai\"\n");
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let plan = plan_from(
            "[api]\nprovider = \"openai\"\n[execution]\npoll_interval_secs = 0\n",
        );
        let err = validate(&plan).unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_empty_id_field_rejected() {
        let plan = plan_from("[api]\nprovider = \"openai\"\n[execution]\nid_field = \" \"\n");
        assert!(validate(&plan).is_err());
    }

    #[test]
    fn test_poll_deadline_shorter_than_interval_rejected() {
        let plan = plan_from(
            "[api]\nprovider = \"openai\"\n[execution]\npoll_interval_secs = 60\nmax_poll_secs = 10\n",
        );
        let err = validate(&plan).unwrap_err();
        assert!(err.to_string().contains("max_poll_secs"));
    }

    #[test]
    fn test_empty_destination_rejected() {
        let plan = plan_from("[api]\nprovider = \"openai\"\n[output]\ndestination = \"\"\n");
        assert!(validate(&plan).is_err());
    }
}
