//! `run` command implementation.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_batch(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading plan");

    if !args.config.exists() {
        return Err(CliError::plan_not_found(args.config.display().to_string()).into());
    }
    if !args.requests.exists() {
        return Err(CliError::request_file_not_found(args.requests.display().to_string()).into());
    }

    // Load and parse plan
    let mut plan = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load plan from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(mode) = args.mode {
        info!(mode = %contracts::ExecutionMode::from(mode), "Overriding execution mode from CLI");
        plan.execution.mode = mode.into();
    }
    if let Some(ref output) = args.output {
        info!(output = %output, "Overriding result destination from CLI");
        plan.output.destination = output.clone();
    }
    if args.content_only {
        plan.output.content_only = true;
    }
    if let Some(poll_interval) = args.poll_interval {
        plan.execution.poll_interval_secs = poll_interval;
    }
    if let Some(request_interval) = args.request_interval {
        plan.execution.request_interval_secs = request_interval;
    }
    if let Some(concurrency) = args.concurrency {
        plan.execution.concurrency = concurrency;
    }
    if let Some(queue_capacity) = args.queue_capacity {
        plan.output.queue_capacity = queue_capacity;
    }

    info!(
        provider = %plan.api.provider,
        mode = %plan.execution.mode,
        destination = %plan.output.destination,
        requests = %args.requests.display(),
        "Plan loaded"
    );

    // Dry run - validate the plan and the request file, then exit
    if args.dry_run {
        let batch = dispatcher::read_request_file(&args.requests)
            .with_context(|| format!("Failed to read {}", args.requests.display()))?;
        info!(requests = batch.len(), "Dry run mode - inputs are valid, exiting");
        print_plan_summary(&plan, batch.len());
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        plan,
        requests_path: args.requests.clone(),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    // Wire shutdown signals to run-level cancellation: stop admitting new
    // requests, let in-flight work finish, keep everything already known.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, finishing in-flight work...");
        signal_cancel.cancel();
    });

    info!("Starting batch execution...");

    let stats = pipeline
        .run(cancel)
        .await
        .map_err(|e| CliError::batch_execution(e.to_string()))?;

    stats.print_summary();

    info!("aidispatch finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print plan summary for dry-run mode
fn print_plan_summary(plan: &contracts::RunPlan, request_count: usize) {
    println!("\n=== Plan Summary ===\n");
    println!("Provider:");
    println!("  Kind: {}", plan.api.provider);
    if let Some(ref base_url) = plan.api.base_url {
        println!("  Base URL: {}", base_url);
    }
    println!("  API key env: {}", plan.api.api_key_env);

    println!("\nExecution:");
    println!("  Mode: {}", plan.execution.mode);
    println!("  Poll interval: {}s", plan.execution.poll_interval_secs);
    println!(
        "  Inter-request interval: {}s",
        plan.execution.request_interval_secs
    );
    println!("  Concurrency: {}", plan.execution.concurrency);
    if plan.execution.retry.enabled() {
        println!(
            "  Retry: up to {} attempts, {}s backoff",
            plan.execution.retry.max_attempts, plan.execution.retry.backoff_secs
        );
    }

    println!("\nOutput:");
    println!("  Destination: {}", plan.output.destination);
    println!("  Content only: {}", plan.output.content_only);

    println!("\nRequests: {}", request_count);
    println!();
}
