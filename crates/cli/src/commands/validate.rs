//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    plan_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<PlanSummary>,
}

#[derive(Serialize)]
struct PlanSummary {
    provider: String,
    mode: String,
    destination: String,
    concurrency: usize,
    poll_interval_secs: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating plan");

    let result = validate_plan(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        let message = result.error.as_deref().unwrap_or("plan validation failed");
        Err(CliError::plan_validation(message).into())
    }
}

fn validate_plan(args: &ValidateArgs) -> ValidationResult {
    let plan_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            plan_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(plan) => {
            let warnings = collect_warnings(&plan);

            ValidationResult {
                valid: true,
                plan_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(PlanSummary {
                    provider: plan.api.provider.to_string(),
                    mode: plan.execution.mode.to_string(),
                    destination: plan.output.destination.clone(),
                    concurrency: plan.execution.concurrency,
                    poll_interval_secs: plan.execution.poll_interval_secs,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            plan_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn collect_warnings(plan: &contracts::RunPlan) -> Vec<String> {
    use contracts::{ExecutionMode, ProviderKind};

    let mut warnings = Vec::new();

    if plan.execution.mode == ExecutionMode::NativeBatch
        && plan.api.provider == ProviderKind::Ollama
    {
        warnings.push(
            "ollama does not support native batch mode; the run will fail before dispatch"
                .to_string(),
        );
    }

    if plan.execution.mode == ExecutionMode::Asynchronous && plan.execution.concurrency == 1 {
        warnings.push(
            "asynchronous mode with concurrency 1 behaves like synchronous mode without \
             ordered output"
                .to_string(),
        );
    }

    if plan.execution.retry.enabled() && plan.execution.retry.backoff_secs == 0 {
        warnings.push("retry enabled with zero backoff may hammer a rate-limited API".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Plan is valid: {}", result.plan_path);
        if let Some(ref summary) = result.summary {
            println!("  Provider: {}", summary.provider);
            println!("  Mode: {}", summary.mode);
            println!("  Destination: {}", summary.destination);
            println!("  Concurrency: {}", summary.concurrency);
            println!("  Poll interval: {}s", summary.poll_interval_secs);
        }
        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("Plan is INVALID: {}", result.plan_path);
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
}
