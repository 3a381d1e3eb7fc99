//! Pipeline orchestrator - coordinates all components.
//!
//! Builds the provider client from the plan, reads the request batch,
//! stands up the result sink, and drives the dispatcher under a run-level
//! cancellation token.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ContractError, Outcome, OutputConfig, OutputTarget, ResultSink, RunPlan};
use dispatcher::{DirSink, Dispatcher, DispatcherError, JsonlSink, SinkHandle};
use observability::{record_outcome_metrics, RunMetricsAggregator};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::RunStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The run plan
    pub plan: RunPlan,

    /// Path to the JSONL request file
    pub requests_path: PathBuf,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self, cancel: CancellationToken) -> Result<RunStats> {
        let start_time = Instant::now();
        let plan = &self.config.plan;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build provider client
        info!(provider = %plan.api.provider, "Building API client...");
        let client = api_client::build_client(&plan.api).context("Failed to build API client")?;

        // Read the batch
        info!(path = %self.config.requests_path.display(), "Reading request file...");
        let batch = dispatcher::read_request_file(&self.config.requests_path)
            .with_context(|| format!("Failed to read {}", self.config.requests_path.display()))?;

        info!(requests = batch.len(), "Batch loaded");

        // Stand up the result sink, with outcome metrics recorded on the way
        let aggregator = Arc::new(Mutex::new(RunMetricsAggregator::new()));
        let sink = create_recording_sink(&plan.output, Arc::clone(&aggregator))
            .context("Failed to create result sink")?;

        info!(
            sink = sink.name(),
            destination = %plan.output.destination,
            content_only = plan.output.content_only,
            "Result sink ready"
        );

        // Dispatch
        let was_cancelled = cancel.clone();
        let dispatcher = Dispatcher::new(Arc::new(client), plan.execution.clone());
        let summary = dispatcher
            .run(batch, &sink, cancel)
            .await
            .context("Batch execution failed")?;

        // Drain and close the sink before reporting
        let sink_metrics = Arc::clone(sink.metrics());
        sink.shutdown().await;

        let outcome_metrics = aggregator.lock().unwrap().summary();

        let stats = RunStats {
            provider: plan.api.provider.to_string(),
            mode: plan.execution.mode,
            destination: plan.output.destination.clone(),
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            duration: start_time.elapsed(),
            cancelled: was_cancelled.is_cancelled(),
            sink_writes: sink_metrics.write_count(),
            sink_write_failures: sink_metrics.failure_count(),
            outcome_metrics,
        };

        info!(
            total = stats.total,
            succeeded = stats.succeeded,
            failed = stats.failed,
            duration_secs = stats.duration.as_secs_f64(),
            cancelled = stats.cancelled,
            "Pipeline finished"
        );

        Ok(stats)
    }
}

/// Sink decorator that records outcome metrics before delegating.
struct RecordingSink<S> {
    inner: S,
    aggregator: Arc<Mutex<RunMetricsAggregator>>,
}

impl<S: ResultSink> ResultSink for RecordingSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn write(&mut self, outcome: &Outcome) -> Result<(), ContractError> {
        record_outcome_metrics(outcome);
        self.aggregator.lock().unwrap().update(outcome);
        self.inner.write(outcome).await
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        self.inner.flush().await
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.inner.close().await
    }
}

/// Create the configured sink wrapped in the metrics decorator.
fn create_recording_sink(
    output: &OutputConfig,
    aggregator: Arc<Mutex<RunMetricsAggregator>>,
) -> Result<SinkHandle, DispatcherError> {
    match output.target() {
        OutputTarget::Aggregate(path) => {
            let sink = JsonlSink::create("aggregate", path, output.content_only)
                .map_err(|e| DispatcherError::sink_creation("aggregate", e.to_string()))?;
            Ok(SinkHandle::spawn(
                RecordingSink {
                    inner: sink,
                    aggregator,
                },
                output.queue_capacity,
            ))
        }
        OutputTarget::PerRequest(path) => {
            let sink = DirSink::create("per_id", path, output.content_only)
                .map_err(|e| DispatcherError::sink_creation("per_id", e.to_string()))?;
            Ok(SinkHandle::spawn(
                RecordingSink {
                    inner: sink,
                    aggregator,
                },
                output.queue_capacity,
            ))
        }
    }
}
