//! Dispatcher - main loop driving a batch through a strategy into the sink

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use contracts::{
    ApiClient, ApiRequest, ContractError, ExecutionConfig, ExecutionMode, Outcome, OutputConfig,
    OutputTarget,
};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::sinks::{DirSink, JsonlSink};
use crate::strategies;

/// Capacity of the strategy-to-dispatcher outcome channel
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Final accounting for one run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Requests handed to the dispatcher
    pub total: usize,
    /// Outcomes that carried a response
    pub succeeded: usize,
    /// Outcomes that carried an error
    pub failed: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Outcomes recorded so far; equals `total` for an uncancelled run
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// The main Dispatcher that drives requests to completion
pub struct Dispatcher<C> {
    client: Arc<C>,
    config: ExecutionConfig,
}

impl<C: ApiClient + Send + Sync + 'static> Dispatcher<C> {
    /// Create a dispatcher for one client and execution configuration
    pub fn new(client: Arc<C>, config: ExecutionConfig) -> Self {
        Self { client, config }
    }

    /// Run the batch to completion
    ///
    /// Streams every outcome to the sink as soon as it is known and returns
    /// the final tally. Per-request failures never surface here; only
    /// precondition and submission violations do. A cancelled run returns a
    /// partial summary covering everything that completed.
    #[instrument(
        name = "dispatcher_run",
        skip(self, batch, sink, cancel),
        fields(mode = %self.config.mode, requests = batch.len())
    )]
    pub async fn run(
        &self,
        batch: Vec<ApiRequest>,
        sink: &SinkHandle,
        cancel: CancellationToken,
    ) -> Result<RunSummary, DispatcherError> {
        let started = Instant::now();

        Self::validate_unique_ids(&batch)?;
        self.validate_capability()?;

        info!(
            mode = %self.config.mode,
            provider = self.client.provider_name(),
            requests = batch.len(),
            "Dispatcher started"
        );

        let total = batch.len();
        let (outcome_tx, mut outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        let strategy_handle = self.spawn_strategy(batch, outcome_tx, cancel);

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut outcome_count: u64 = 0;

        // Channel closes when the strategy drops its sender; everything the
        // strategy managed to produce is flushed to the sink first.
        while let Some(outcome) = outcome_rx.recv().await {
            outcome_count += 1;
            if outcome.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }

            sink.send(outcome).await?;

            if outcome_count.is_multiple_of(100) {
                debug!(outcomes = outcome_count, "Dispatcher progress");
            }
        }

        match strategy_handle.await {
            Ok(result) => result?,
            Err(e) => {
                return Err(DispatcherError::Contract(ContractError::Other(format!(
                    "strategy task panicked: {e}"
                ))))
            }
        }

        let summary = RunSummary {
            total,
            succeeded,
            failed,
            duration: started.elapsed(),
        };

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_secs = summary.duration.as_secs_f64(),
            "Dispatcher finished"
        );

        Ok(summary)
    }

    fn spawn_strategy(
        &self,
        batch: Vec<ApiRequest>,
        outcome_tx: mpsc::Sender<Outcome>,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<(), DispatcherError>> {
        let client = Arc::clone(&self.client);
        let config = self.config.clone();

        tokio::spawn(async move {
            match config.mode {
                ExecutionMode::Synchronous => {
                    strategies::synchronous::run(
                        client.as_ref(),
                        &config,
                        &outcome_tx,
                        &cancel,
                        &batch,
                    )
                    .await;
                    Ok(())
                }
                ExecutionMode::Asynchronous => {
                    strategies::bounded::run(client, &config, outcome_tx, cancel, batch).await;
                    Ok(())
                }
                ExecutionMode::NativeBatch => {
                    strategies::native_batch::run(
                        client.as_ref(),
                        &config,
                        &outcome_tx,
                        &cancel,
                        &batch,
                    )
                    .await
                }
            }
        })
    }

    /// Precondition: every custom_id appears exactly once
    fn validate_unique_ids(batch: &[ApiRequest]) -> Result<(), DispatcherError> {
        let mut seen = HashSet::with_capacity(batch.len());
        for request in batch {
            if !seen.insert(request.custom_id.as_str()) {
                return Err(DispatcherError::DuplicateRequestId {
                    custom_id: request.custom_id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Precondition: the client implements what the mode needs
    fn validate_capability(&self) -> Result<(), DispatcherError> {
        if self.config.mode == ExecutionMode::NativeBatch && !self.client.supports_native_batch() {
            return Err(DispatcherError::UnsupportedMode {
                mode: self.config.mode,
                provider: self.client.provider_name().to_string(),
            });
        }
        Ok(())
    }
}

/// Create a SinkHandle from output configuration
#[instrument(name = "dispatcher_create_sink_handle", skip(output))]
pub fn create_sink_handle(output: &OutputConfig) -> Result<SinkHandle, DispatcherError> {
    match output.target() {
        OutputTarget::Aggregate(path) => {
            let sink = JsonlSink::create("aggregate", path, output.content_only)
                .map_err(|e| DispatcherError::sink_creation("aggregate", e.to_string()))?;
            Ok(SinkHandle::spawn(sink, output.queue_capacity))
        }
        OutputTarget::PerRequest(path) => {
            let sink = DirSink::create("per_id", path, output.content_only)
                .map_err(|e| DispatcherError::sink_creation("per_id", e.to_string()))?;
            Ok(SinkHandle::spawn(sink, output.queue_capacity))
        }
    }
}
